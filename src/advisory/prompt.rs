use serde_json::{Value, json};

use super::AdvisoryContext;

/// Instruction text sent with every advisory request.
pub fn build_prompt(ctx: &AdvisoryContext) -> String {
    let flow = ctx
        .flow_speed
        .map(|v| format!("{v} m/s"))
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "You are an expert system for flood disaster response.\n\
         The following sensor data indicates an emergency:\n\
         - Location: {}\n\
         - Water height: {} cm\n\
         - Flow speed: {}\n\
         - Status: {}\n\n\
         Based on this data, produce a tactical report as JSON that strictly \
         follows the response schema. Do not add markdown.",
        ctx.location, ctx.water_height_cm, flow, ctx.status
    )
}

/// Output structure the service is constrained to.
pub fn report_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "analisis_singkat": { "type": "STRING" },
            "rekomendasi_tindakan": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "pesan_untuk_warga": { "type": "STRING" }
        },
        "required": ["analisis_singkat", "rekomendasi_tindakan", "pesan_untuk_warga"]
    })
}

/// Full `generateContent` body.
pub fn generate_request(ctx: &AdvisoryContext) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": build_prompt(ctx) }] }],
        "generationConfig": {
            "response_mime_type": "application/json",
            "response_schema": report_schema()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> AdvisoryContext {
        AdvisoryContext {
            sensor_id: "sensor01".into(),
            location: "Hulu Sungai Tallo".into(),
            water_height_cm: 204.3,
            flow_speed: Some(2.1),
            status: "🚨 AWAS".into(),
        }
    }

    #[test]
    fn test_prompt_carries_sensor_context() {
        let prompt = build_prompt(&ctx());
        assert!(prompt.contains("Hulu Sungai Tallo"));
        assert!(prompt.contains("204.3 cm"));
        assert!(prompt.contains("2.1 m/s"));
    }

    #[test]
    fn test_request_constrains_output_structure() {
        let body = generate_request(&ctx());
        let config = &body["generationConfig"];
        assert_eq!(config["response_mime_type"], "application/json");
        assert_eq!(config["response_schema"]["required"].as_array().unwrap().len(), 3);
        assert!(body["contents"][0]["parts"][0]["text"].as_str().unwrap().contains("AWAS"));
    }
}
