use serde::Serialize;
use serde_json::Value;
use time::Date;

use crate::ai::client::{extract_json, CompletionClient, CompletionRequest};
use crate::ai::error::AiError;
use crate::inventory::repo::FoodItem;
use crate::status::days_until;

#[derive(Debug, Serialize)]
pub struct RecipeSuggestion {
    pub name: String,
    pub emoji: String,
    pub description: String,
    pub serving_size: String,
    pub calories: f64,
    pub protein: f64,
    pub fats: f64,
    pub carbs: f64,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

const SYSTEM_PROMPT: &str = r#"You are an expert nutritionist chef. Your job is to suggest healthy, practical recipes using the ingredients the user has on hand. Prioritize ingredients that are expiring soon or recently expired. Respond ONLY with a valid JSON object, no extra text, in this format:
{
  "recipes": [
    {
      "name": "Recipe name",
      "emoji": "a representative emoji",
      "description": "Short description of the recipe",
      "serving_size": "2 servings",
      "calories": 350,
      "protein": 25,
      "fats": 12,
      "carbs": 30,
      "ingredients": ["200g chicken", "1 cup rice"],
      "instructions": ["Step 1: ...", "Step 2: ..."]
    }
  ]
}"#;

pub async fn generate_recipes(
    ai: &dyn CompletionClient,
    model: &str,
    items: &[FoodItem],
    count: u32,
    today: Date,
) -> Result<Vec<RecipeSuggestion>, AiError> {
    let inventory = inventory_digest(items, today);
    let user_prompt = format!(
        "I have these ingredients in my inventory:\n{inventory}\n\nSuggest {count} recipes I \
         can prepare with them. Prioritize the ingredients that are about to expire. Nutrition \
         values should be reasonable per-serving estimates."
    );

    let messages = serde_json::json!([
        { "role": "system", "content": SYSTEM_PROMPT },
        { "role": "user", "content": user_prompt },
    ]);

    let content = ai
        .complete(CompletionRequest {
            model: model.to_string(),
            messages,
            temperature: 0.7,
            max_tokens: 2000,
        })
        .await?;

    let raw: Value = extract_json(&content)?;
    let recipes = raw
        .get("recipes")
        .and_then(Value::as_array)
        .ok_or(AiError::Unparsable)?;

    Ok(recipes.iter().map(sanitize_recipe).collect())
}

/// One line per item, flagging urgency so the model favors what is about
/// to go to waste.
fn inventory_digest(items: &[FoodItem], today: Date) -> String {
    items
        .iter()
        .map(|item| {
            let days = days_until(item.expiration_date, today);
            let urgency = if days <= 0 {
                " (expired)"
            } else if days <= 2 {
                " (expiring soon)"
            } else {
                ""
            };
            format!("- {}: {} {}{}", item.name, item.quantity, item.unit, urgency)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn sanitize_recipe(raw: &Value) -> RecipeSuggestion {
    RecipeSuggestion {
        name: non_empty_string(raw, "name").unwrap_or_else(|| "Unnamed recipe".to_string()),
        emoji: non_empty_string(raw, "emoji").unwrap_or_else(|| "🍽️".to_string()),
        description: non_empty_string(raw, "description").unwrap_or_default(),
        serving_size: non_empty_string(raw, "serving_size")
            .unwrap_or_else(|| "1 serving".to_string()),
        calories: raw.get("calories").and_then(Value::as_f64).unwrap_or(0.0),
        protein: raw.get("protein").and_then(Value::as_f64).unwrap_or(0.0),
        fats: raw.get("fats").and_then(Value::as_f64).unwrap_or(0.0),
        carbs: raw.get("carbs").and_then(Value::as_f64).unwrap_or(0.0),
        ingredients: string_list(raw, "ingredients"),
        instructions: string_list(raw, "instructions"),
    }
}

fn non_empty_string(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn string_list(raw: &Value, key: &str) -> Vec<String> {
    raw.get(key)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FoodCategory, FoodStatus, ItemDisposition, StorageLocation};
    use async_trait::async_trait;
    use time::macros::date;
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    struct CannedAi(String);

    #[async_trait]
    impl CompletionClient for CannedAi {
        async fn complete(&self, _req: CompletionRequest) -> Result<String, AiError> {
            Ok(self.0.clone())
        }
    }

    fn item(name: &str, expires_in: i64, today: Date) -> FoodItem {
        FoodItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: FoodCategory::Other,
            quantity: 2.0,
            unit: "pcs".to_string(),
            purchase_date: today,
            expiration_date: today + Duration::days(expires_in),
            storage_location: StorageLocation::Fridge,
            status: FoodStatus::Fresh,
            disposition: ItemDisposition::Active,
            price: None,
            currency: "MXN".to_string(),
            notes: String::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn digest_marks_urgency() {
        let today = date!(2026 - 03 - 15);
        let items = vec![
            item("yogurt", -1, today),
            item("chicken", 2, today),
            item("rice", 30, today),
        ];
        let digest = inventory_digest(&items, today);
        assert!(digest.contains("- yogurt: 2 pcs (expired)"));
        assert!(digest.contains("- chicken: 2 pcs (expiring soon)"));
        assert!(digest.contains("- rice: 2 pcs\n") || digest.ends_with("- rice: 2 pcs"));
    }

    #[tokio::test]
    async fn sanitizes_partial_recipes() {
        let ai = CannedAi(
            r#"{"recipes": [{"name": "", "calories": "lots", "ingredients": ["1 egg"]}]}"#
                .to_string(),
        );
        let recipes = generate_recipes(&ai, "m", &[], 1, date!(2026 - 03 - 15))
            .await
            .unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "Unnamed recipe");
        assert_eq!(recipes[0].serving_size, "1 serving");
        assert_eq!(recipes[0].calories, 0.0);
        assert_eq!(recipes[0].ingredients, vec!["1 egg".to_string()]);
        assert!(recipes[0].instructions.is_empty());
    }

    #[tokio::test]
    async fn reply_without_recipes_is_unparsable() {
        let ai = CannedAi(r#"{"dishes": []}"#.to_string());
        let err = generate_recipes(&ai, "m", &[], 3, date!(2026 - 03 - 15))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Unparsable));
    }
}
