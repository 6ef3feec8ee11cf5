use esdev_core::version::{version_string, OUTPUT_SCHEMA_VERSION, VERSION};
use miette::Result;

pub fn run(json: bool) -> Result<()> {
    if json {
        super::print_json(&serde_json::json!({
            "ok": true,
            "schema_version": OUTPUT_SCHEMA_VERSION,
            "version": VERSION,
        }))
    } else {
        println!("{}", version_string());
        Ok(())
    }
}
