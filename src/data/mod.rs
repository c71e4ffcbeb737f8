pub mod export;
pub mod input;

pub use export::{
    report_to_json, write_best_agent_csv, write_report_json, ExportError,
    DEFAULT_BEST_AGENT_CSV_PATH, DEFAULT_REPORT_PATH,
};
pub use input::{load_input, parse_json_input, parse_yaml_input, DeliveryInput, LoadError};
