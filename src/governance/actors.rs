//! Well-known actor identities and action names used by the pipeline

pub const MASTER_AGENT: &str = "MasterAgent";
pub const DATA_AGENT: &str = "DataAgent";
pub const DIAGNOSIS_AGENT: &str = "DiagnosisAgent";
pub const MANUFACTURING_AGENT: &str = "ManufacturingAgent";
pub const CUSTOMER_AGENT: &str = "CustomerAgent";
pub const SCHEDULING_AGENT: &str = "SchedulingAgent";

/// Actions the orchestrator reports to the monitor
pub mod actions {
    pub const ANALYZE_VEHICLE: &str = "analyze_vehicle";
    pub const READ_SENSOR_DATA: &str = "read_sensor_data";
    pub const PREDICT_FAILURE: &str = "predict_failure";
    pub const LOG_FAILURE_PATTERN: &str = "log_failure_pattern";
    pub const ENGAGE_CUSTOMER: &str = "engage_customer";
    pub const GET_DASHBOARD_DATA: &str = "get_dashboard_data";
    pub const BOOK_SERVICE: &str = "book_service";
    pub const ANSWER_QUERY: &str = "answer_query";
    pub const GENERATE_REPORTS: &str = "generate_reports";
    pub const NOTIFY_MANUFACTURER: &str = "notify_manufacturer";
}

/// Resource name for a vehicle-scoped action
pub fn vehicle_resource(vehicle_id: &str) -> String {
    format!("vehicle_{}", vehicle_id)
}

pub fn batch_resource(batch_id: &str) -> String {
    format!("batch_{}", batch_id)
}
