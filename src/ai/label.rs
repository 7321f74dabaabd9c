use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use time::macros::format_description;
use time::Date;

use crate::ai::client::{extract_json, CompletionClient, CompletionRequest};
use crate::ai::error::AiError;
use crate::types::{FoodCategory, StorageLocation};

lazy_static! {
    static ref ISO_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex");
}

/// Fields recognized on a product label. Everything is optional; only
/// values that survive sanitization are present.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct ScannedProduct {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<FoodCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<StorageLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

const SYSTEM_PROMPT: &str = r#"You are an expert at identifying packaged food products from photos of their labels. Analyze the image and extract what you can identify. Respond ONLY with a valid JSON object, no extra text, using these fields (all optional; include only the ones you can identify):

{
  "name": "Product name",
  "expiration_date": "YYYY-MM-DD",
  "category": "one of: fruits, vegetables, dairy, cereals, canned, meat, frozen, beverages, condiments, snacks, other",
  "quantity": 1,
  "unit": "kg, g, L, mL, pcs, etc.",
  "storage_location": "one of: fridge, freezer, pantry, counter",
  "price": 0.00
}

Notes:
- The date must be in YYYY-MM-DD format
- The category must be exactly one of the listed values
- The storage_location must be exactly one of the listed values
- If you cannot identify a field with confidence, leave it out
- For storage_location, use your knowledge of the product to suggest where to keep it"#;

pub async fn scan_product_label(
    ai: &dyn CompletionClient,
    model: &str,
    image_base64: &str,
) -> Result<ScannedProduct, AiError> {
    let messages = serde_json::json!([
        { "role": "system", "content": SYSTEM_PROMPT },
        {
            "role": "user",
            "content": [
                {
                    "type": "text",
                    "text": "Analyze this food product label and extract the data you can identify.",
                },
                {
                    "type": "image_url",
                    "image_url": {
                        "url": format!("data:image/jpeg;base64,{image_base64}"),
                        "detail": "high",
                    },
                },
            ],
        },
    ]);

    let content = ai
        .complete(CompletionRequest {
            model: model.to_string(),
            messages,
            temperature: 0.2,
            max_tokens: 500,
        })
        .await?;

    let raw: Value = extract_json(&content)?;
    Ok(sanitize(&raw))
}

/// Keep only fields the model returned in a usable form; anything outside
/// the closed sets, malformed, or non-positive is dropped rather than
/// surfaced as an error.
fn sanitize(raw: &Value) -> ScannedProduct {
    let name = raw
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let expiration_date = raw
        .get("expiration_date")
        .and_then(Value::as_str)
        .filter(|s| ISO_DATE.is_match(s))
        .and_then(|s| Date::parse(s, format_description!("[year]-[month]-[day]")).ok());

    let category = raw
        .get("category")
        .and_then(|v| serde_json::from_value::<FoodCategory>(v.clone()).ok());

    let quantity = raw
        .get("quantity")
        .and_then(Value::as_f64)
        .filter(|q| *q > 0.0);

    let unit = raw
        .get("unit")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let storage_location = raw
        .get("storage_location")
        .and_then(|v| serde_json::from_value::<StorageLocation>(v.clone()).ok());

    let price = raw
        .get("price")
        .and_then(Value::as_f64)
        .filter(|p| *p > 0.0);

    ScannedProduct {
        name,
        expiration_date,
        category,
        quantity,
        unit,
        storage_location,
        price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use time::macros::date;

    struct CannedAi(String);

    #[async_trait]
    impl CompletionClient for CannedAi {
        async fn complete(&self, _req: CompletionRequest) -> Result<String, AiError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn keeps_recognized_fields() {
        let ai = CannedAi(
            r#"{"name": "Whole milk", "expiration_date": "2026-08-20", "category": "dairy",
                "quantity": 1, "unit": "L", "storage_location": "fridge", "price": 25.5}"#
                .to_string(),
        );
        let scanned = scan_product_label(&ai, "m", "aGk=").await.unwrap();
        assert_eq!(scanned.name.as_deref(), Some("Whole milk"));
        assert_eq!(scanned.expiration_date, Some(date!(2026 - 08 - 20)));
        assert_eq!(scanned.category, Some(FoodCategory::Dairy));
        assert_eq!(scanned.storage_location, Some(StorageLocation::Fridge));
        assert_eq!(scanned.price, Some(25.5));
    }

    #[tokio::test]
    async fn drops_values_outside_the_closed_sets() {
        let ai = CannedAi(
            r#"{"name": "  ", "expiration_date": "20-08-2026", "category": "electronics",
                "quantity": -2, "storage_location": "garage", "price": 0}"#
                .to_string(),
        );
        let scanned = scan_product_label(&ai, "m", "aGk=").await.unwrap();
        assert_eq!(scanned, ScannedProduct::default());
    }

    #[tokio::test]
    async fn drops_well_formed_but_impossible_dates() {
        let ai = CannedAi(r#"{"expiration_date": "2026-13-40"}"#.to_string());
        let scanned = scan_product_label(&ai, "m", "aGk=").await.unwrap();
        assert_eq!(scanned.expiration_date, None);
    }

    #[tokio::test]
    async fn recovers_wrapped_json() {
        let ai = CannedAi("Here you go:\n```json\n{\"name\": \"Beans\"}\n```".to_string());
        let scanned = scan_product_label(&ai, "m", "aGk=").await.unwrap();
        assert_eq!(scanned.name.as_deref(), Some("Beans"));
    }

    #[tokio::test]
    async fn unparsable_reply_is_an_error() {
        let ai = CannedAi("I could not read the label, sorry.".to_string());
        let err = scan_product_label(&ai, "m", "aGk=").await.unwrap_err();
        assert!(matches!(err, AiError::Unparsable));
    }
}
