use nu_ansi_term::Color::{Blue, Cyan, Yellow};
use sift_filter::Declarative;
use tracing::{info, warn};

use crate::utils::Colored;

pub fn list_entities(filters: &Declarative) {
    let entities = filters.registry.entities();
    if entities.is_empty() {
        warn!("No entities declared. Add [[entities]] to the configuration file.");
        return;
    }

    for name in entities {
        let Ok(def) = filters.registry.get(name) else {
            continue;
        };
        let table = filters
            .schema
            .entity(name)
            .map(|e| e.table.as_str())
            .unwrap_or(name);

        info!("{} ({})", Colored(Blue, name), table);
        for method in def.methods() {
            info!("  {}", Colored(Cyan, method));
        }
        for (relation, fields) in def.relations() {
            info!("  {} -> [{}]", Colored(Yellow, relation), fields.join(", "));
        }
    }
}

