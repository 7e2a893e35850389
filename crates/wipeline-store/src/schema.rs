//! Staging and fact table definitions.
//!
//! Both tables and the merge statement derive from [`COLUMN_MAP`], the
//! ordered pairing of fact-table columns with the flattened staging path
//! each one is filled from. Generating the DDL and the merge SQL from the
//! same constant keeps the three from drifting apart.

/// Scratch table loaded fresh each cycle
pub const STAGE_TABLE: &str = "blancco_data_stage";

/// Durable fact table, append-only, keyed for dedup by `hash_data`
pub const FACT_TABLE: &str = "blancco_data";

/// Fact-table columns paired with the staging path each is filled from.
///
/// Order matters: it fixes the column order of both tables and of the
/// merge statement. `load_datetime` and `hash_data` carry the same name in
/// both tables and are appended by the SQL builders rather than listed
/// here.
pub const COLUMN_MAP: [(&str, &str); 119] = [
    (
        "business_location",
        "description.description_entries.company_information.business_location",
    ),
    (
        "business_name",
        "description.description_entries.company_information.business_name",
    ),
    (
        "erasure_person",
        "description.description_entries.company_information.erasure_person",
    ),
    (
        "erasure_provider",
        "description.description_entries.company_information.erasure_provider",
    ),
    ("verified", "description.description_entries.verified"),
    ("document_id", "description.document_id"),
    (
        "product_name",
        "description.document_log.log_entry.author.product_name",
    ),
    (
        "product_revision",
        "description.document_log.log_entry.author.product_revision",
    ),
    (
        "product_version",
        "description.document_log.log_entry.author.product_version",
    ),
    ("log_entry_date", "description.document_log.log_entry.date"),
    ("disk_capacity", "disk.capacity"),
    ("disk_serial", "disk.serial"),
    ("disk_type", "disk.type"),
    ("disk_vendor", "disk.vendor"),
    ("erasure_elapsed_time", "erasure.elapsed_time"),
    ("erasure_end_time", "erasure.end_time"),
    (
        "erasure_failure_message",
        "erasure.erasure_details.failure.message",
    ),
    ("erasure_standard_name", "erasure.erasure_standard_name"),
    ("erasure_exception_message", "erasure.exception.message"),
    (
        "erasure_details_exception_message",
        "erasure.erasure_details.exception.message",
    ),
    ("erasure_firmware_rounds", "erasure.firmware_rounds"),
    ("erasure_overwriting_rounds", "erasure.overwriting_rounds"),
    ("erasure_start_time", "erasure.start_time"),
    ("erasure_state", "erasure.state"),
    ("erasure_target_capacity", "erasure.target.capacity"),
    ("erasure_target_serial", "erasure.target.serial"),
    ("erasure_target_type", "erasure.target.type"),
    ("erasure_target_vendor", "erasure.target.vendor"),
    ("erasure_timestamp", "erasure.timestamp"),
    ("erasure_total_erasure_rounds", "erasure.total_erasure_rounds"),
    ("camera_module_serial", "hardware.cameras.camera.module_serial"),
    ("camera_serial", "hardware.cameras.camera.serial"),
    ("camera_type", "hardware.cameras.camera.type"),
    (
        "battery_capacity_current",
        "hardware.mobile_battery.battery_capacity_current",
    ),
    (
        "battery_capacity_design",
        "hardware.mobile_battery.battery_capacity_design",
    ),
    (
        "battery_capacity_health_level",
        "hardware.mobile_battery.battery_capacity_health_level",
    ),
    (
        "battery_capacity_wear_level",
        "hardware.mobile_battery.battery_capacity_wear_level",
    ),
    (
        "battery_chemical_weighted_ra",
        "hardware.mobile_battery.battery_chemical_weighted_ra",
    ),
    ("battery_cycles", "hardware.mobile_battery.battery_cycles"),
    (
        "battery_health_metric",
        "hardware.mobile_battery.battery_health_metric",
    ),
    (
        "battery_manufacture_date",
        "hardware.mobile_battery.battery_manufacture_date",
    ),
    ("battery_serial", "hardware.mobile_battery.battery_serial"),
    (
        "battery_temperature",
        "hardware.mobile_battery.battery_temperature",
    ),
    ("battery_vendor", "hardware.mobile_battery.battery_vendor"),
    ("sim_card", "hardware.sim_cards.sim_card"),
    ("sim_card_iccid", "hardware.sim_cards.sim_card.iccid"),
    ("sim_card_imsi", "hardware.sim_cards.sim_card.imsi"),
    ("sim_card_slot", "hardware.sim_cards.sim_card.slot"),
    ("sim_card_esim", "hardware.sim_cards.sim_card.esim"),
    ("a_model_number", "hardware.system.a_model_number"),
    ("carrier_code", "hardware.system.carrier_code"),
    ("chassis_type", "hardware.system.chassis_type"),
    ("country_of_origin", "hardware.system.country_of_origin"),
    ("cover_glass_serial", "hardware.system.cover_glass_serial"),
    ("device_color", "hardware.system.device_color"),
    ("due_diligence_result", "hardware.system.due_diligence_result"),
    ("ecid", "hardware.system.ecid"),
    ("find_my_iphone", "hardware.system.find_my_iphone"),
    ("find_my_iphone_source", "hardware.system.find_my_iphone_source"),
    ("frp_status", "hardware.system.frp_status"),
    ("identifier", "hardware.system.identifier"),
    ("imei", "hardware.system.imei"),
    ("imei_two", "hardware.system.imei_two"),
    ("internal_model", "hardware.system.internal_model"),
    ("manufacturer", "hardware.system.manufacturer"),
    ("manufacturing_date", "hardware.system.manufacturing_date"),
    ("market_name", "hardware.system.market_name"),
    ("mdm_status", "hardware.system.mdm_status"),
    ("meid", "hardware.system.meid"),
    ("meid_fourteen", "hardware.system.meid_fourteen"),
    ("model", "hardware.system.model"),
    ("name", "hardware.system.name"),
    ("product_code", "hardware.system.product_code"),
    ("project_code", "hardware.system.project_code"),
    ("ram", "hardware.system.ram"),
    ("raw_panel_serial", "hardware.system.raw_panel_serial"),
    ("region", "hardware.system.region"),
    ("region_code", "hardware.system.region_code"),
    ("region_name", "hardware.system.region_name"),
    ("rooted", "hardware.system.rooted"),
    ("serial", "hardware.system.serial"),
    ("touch_id_serial", "hardware.system.touch_id_serial"),
    ("uuid", "hardware.system.uuid"),
    ("wifi_mac", "hardware.system.wifi_mac"),
    ("operating_system", "software.operating_system"),
    ("operating_system_name", "software.operating_system.name"),
    (
        "operating_system_program_name",
        "software.operating_system.programs.program.name",
    ),
    (
        "operating_system_program_version",
        "software.operating_system.programs.program.version",
    ),
    ("operating_system_version", "software.operating_system.version"),
    ("user_batterycharging", "user_data.fields.batterycharging"),
    ("user_comments", "user_data.fields.comments"),
    ("user_country", "user_data.fields.country"),
    ("user_device_identifier", "user_data.fields.device_identifier"),
    ("user_erasure_person", "user_data.fields.erasure_person"),
    ("user_imei_2", "user_data.fields.imei_2"),
    ("user_imei_3", "user_data.fields.imei_3"),
    (
        "user_oppo_device_imeicache_1",
        "user_data.fields.oppo_device_imeicache_1",
    ),
    (
        "user_oppo_device_imeicache_2",
        "user_data.fields.oppo_device_imeicache_2",
    ),
    (
        "user_persist_sys_show_device_imei_1",
        "user_data.fields.persist_sys_show_device_imei_1",
    ),
    (
        "user_persist_sys_updater_imei_1",
        "user_data.fields.persist_sys_updater_imei_1",
    ),
    (
        "user_persist_sys_updater_imei_2",
        "user_data.fields.persist_sys_updater_imei_2",
    ),
    ("user_r_counter", "user_data.fields.r_counter"),
    ("user_r_country", "user_data.fields.r_country"),
    ("user_r_erasure", "user_data.fields.r_erasure"),
    ("user_r_esim", "user_data.fields.r_esim"),
    ("user_r_fmip", "user_data.fields.r_fmip"),
    ("user_r_frp", "user_data.fields.r_frp"),
    ("user_r_location", "user_data.fields.r_location"),
    ("user_r_mdm", "user_data.fields.r_mdm"),
    ("user_r_place", "user_data.fields.r_place"),
    ("user_r_process", "user_data.fields.r_process"),
    ("user_r_region", "user_data.fields.r_region"),
    ("user_r_workstaion", "user_data.fields.r_workstaion"),
    ("user_r_workstation", "user_data.fields.r_workstation"),
    (
        "user_ro_config_hw_imei_sv_enable_1",
        "user_data.fields.ro_config_hw_imei_sv_enable_1",
    ),
    (
        "user_ro_config_hw_imei_sv_show_two_2",
        "user_data.fields.ro_config_hw_imei_sv_show_two_2",
    ),
    (
        "user_ro_imei_match_status_3",
        "user_data.fields.ro_imei_match_status_3",
    ),
    ("user_ro_product_imeisv_3", "user_data.fields.ro_product_imeisv_3"),
    ("user_technician_name", "user_data.fields.technician_name"),
];

/// Combined DDL for both tables, suitable for `execute_batch`
pub fn schema_ddl() -> String {
    format!("{}\n{}", stage_ddl(), fact_ddl())
}

/// DDL for the staging table.
///
/// Every data column is TEXT and named by its flattened path.
/// `load_datetime` defaults to the insert wall-clock (UTC); `hash_data` is
/// filled by a separate pass after staging.
pub fn stage_ddl() -> String {
    let mut columns: Vec<String> = COLUMN_MAP
        .iter()
        .map(|(_, path)| format!("    \"{}\" TEXT", path))
        .collect();
    columns.push("    \"load_datetime\" TEXT DEFAULT (datetime('now'))".to_string());
    columns.push("    \"hash_data\" TEXT".to_string());
    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" (\n{}\n);",
        STAGE_TABLE,
        columns.join(",\n")
    )
}

/// DDL for the fact table plus its hash-lookup index
pub fn fact_ddl() -> String {
    let mut columns: Vec<String> = vec!["    \"rec_id\" INTEGER PRIMARY KEY".to_string()];
    columns.extend(
        COLUMN_MAP
            .iter()
            .map(|(fact, _)| format!("    \"{}\" TEXT", fact)),
    );
    columns.push("    \"load_datetime\" TEXT".to_string());
    columns.push("    \"hash_data\" TEXT".to_string());
    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" (\n{}\n);\n\
         CREATE INDEX IF NOT EXISTS \"idx_{}_hash_data\" ON \"{}\" (\"hash_data\");",
        FACT_TABLE,
        columns.join(",\n"),
        FACT_TABLE,
        FACT_TABLE
    )
}

/// Parameterized insert into the staging table for the given columns
pub fn stage_insert_sql(columns: &[String]) -> String {
    let list = columns
        .iter()
        .map(|column| format!("\"{}\"", column))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|idx| format!("?{}", idx))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO \"{}\" ({}) VALUES ({})",
        STAGE_TABLE, list, placeholders
    )
}

/// Hash-guarded insert from staging into the fact table.
///
/// Staged rows whose `hash_data` already exists in the fact table are
/// skipped, which is what makes re-running a window harmless.
pub fn merge_sql() -> String {
    let mut inserts: Vec<String> = COLUMN_MAP
        .iter()
        .map(|(fact, _)| format!("\"{}\"", fact))
        .collect();
    inserts.push("\"load_datetime\"".to_string());
    inserts.push("\"hash_data\"".to_string());

    let mut selects: Vec<String> = COLUMN_MAP
        .iter()
        .map(|(_, path)| format!("s.\"{}\"", path))
        .collect();
    selects.push("s.\"load_datetime\"".to_string());
    selects.push("s.\"hash_data\"".to_string());

    format!(
        "INSERT INTO \"{fact}\" ({inserts})\n\
         SELECT DISTINCT {selects}\n\
         FROM \"{stage}\" s\n\
         LEFT JOIN \"{fact}\" d ON d.\"hash_data\" = s.\"hash_data\"\n\
         WHERE d.\"rec_id\" IS NULL",
        fact = FACT_TABLE,
        stage = STAGE_TABLE,
        inserts = inserts.join(", "),
        selects = selects.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_column_map_has_no_duplicates() {
        let fact: HashSet<_> = COLUMN_MAP.iter().map(|(f, _)| *f).collect();
        let stage: HashSet<_> = COLUMN_MAP.iter().map(|(_, s)| *s).collect();
        assert_eq!(fact.len(), COLUMN_MAP.len());
        assert_eq!(stage.len(), COLUMN_MAP.len());
    }

    #[test]
    fn test_stage_paths_are_lowercase() {
        // Flattened keys are lowercased, so staging columns must be too
        for (_, path) in &COLUMN_MAP {
            assert_eq!(*path, path.to_lowercase(), "column {} not lowercase", path);
        }
    }

    #[test]
    fn test_stage_ddl_shape() {
        let ddl = stage_ddl();
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS \"blancco_data_stage\""));
        assert!(ddl.contains("\"description.document_id\" TEXT"));
        assert!(ddl.contains("\"load_datetime\" TEXT DEFAULT (datetime('now'))"));
        assert!(ddl.contains("\"hash_data\" TEXT"));
    }

    #[test]
    fn test_fact_ddl_shape() {
        let ddl = fact_ddl();
        assert!(ddl.contains("\"rec_id\" INTEGER PRIMARY KEY"));
        assert!(ddl.contains("\"business_location\" TEXT"));
        assert!(ddl.contains("\"user_technician_name\" TEXT"));
        assert!(ddl.contains("CREATE INDEX IF NOT EXISTS \"idx_blancco_data_hash_data\""));
    }

    #[test]
    fn test_stage_insert_sql_numbers_placeholders() {
        let sql = stage_insert_sql(&["a".to_string(), "b".to_string()]);
        assert_eq!(
            sql,
            "INSERT INTO \"blancco_data_stage\" (\"a\", \"b\") VALUES (?1, ?2)"
        );
    }

    #[test]
    fn test_merge_sql_guards_on_hash() {
        let sql = merge_sql();
        assert!(sql.starts_with("INSERT INTO \"blancco_data\""));
        assert!(sql.contains("SELECT DISTINCT"));
        assert!(sql.contains("LEFT JOIN \"blancco_data\" d ON d.\"hash_data\" = s.\"hash_data\""));
        assert!(sql.contains("WHERE d.\"rec_id\" IS NULL"));
        // Every staged path the merge reads must exist in the staging DDL
        let stage = stage_ddl();
        for (_, path) in &COLUMN_MAP {
            assert!(stage.contains(&format!("\"{}\"", path)), "missing {}", path);
        }
    }
}
