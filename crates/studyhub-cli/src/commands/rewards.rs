use crate::common::{open_hub, print_json};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let hub = open_hub()?;
    print_json(&hub.rewards())
}
