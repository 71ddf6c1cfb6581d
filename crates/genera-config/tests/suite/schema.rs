use genera_config::json_schema;

#[test]
fn schema_describes_sections_and_limits() {
    let schema = serde_json::to_value(json_schema()).unwrap();

    let properties = schema["properties"].as_object().unwrap();
    assert!(properties.contains_key("cache"));
    assert!(properties.contains_key("logging"));
    assert_eq!(schema["additionalProperties"], serde_json::json!(false));

    let cache = &schema["definitions"]["CacheConfig"];
    assert_eq!(cache["properties"]["capacity"]["minimum"], serde_json::json!(1.0));
    assert_eq!(cache["properties"]["capacity"]["default"], serde_json::json!(512));
}
