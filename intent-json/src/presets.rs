//! Built-in instruction/schema pairs.

use serde::Serialize;

use crate::form::InputMode;

const IMAGE_INVENTORY_PROMPT: &str = r#"Analyze the image to identify and count all animals and fruits.

Your response must be a valid JSON object. Each category must be an array of objects, each containing a "name" and "count". If a category is empty, return an empty array [].

If the image is unusable (e.g., blurry, irrelevant), set "isTaskRefused" to true and provide a "refusalReason"."#;

const IMAGE_INVENTORY_SCHEMA: &str = "z.object({
  isTaskRefused: z.boolean(),
  refusalReason: z.string().nullable(),
  animals: z.array(
    z.object({
      name: z.string(),
      count: z.number(),
    })
  ),
  fruits: z.array(
    z.object({
      name: z.string(),
      count: z.number(),
    })
  ),
})";

const TEXT_INTENT_PROMPT: &str = r#"Analyze the user's text and extract relevant information.

Your response must be a valid JSON object following the provided schema.

If the text is unusable or cannot be processed, set "isTaskRefused" to true and provide a "refusalReason"."#;

const TEXT_INTENT_SCHEMA: &str = "z.object({
  isTaskRefused: z.boolean(),
  refusalReason: z.string().nullable(),
  sentiment: z.enum(['positive', 'negative', 'neutral']),
  topics: z.array(z.string()),
  entities: z.array(
    z.object({
      name: z.string(),
      type: z.string(),
    })
  ),
})";

const TEXT_INTENT_SAMPLES: &[&str] = &[
    "I love the new iPhone 15! Apple really outdid themselves this time. The camera quality is amazing and the battery life is incredible.",
    "The weather in San Francisco today is terrible. It's been raining all morning and I forgot my umbrella at home.",
    "Breaking: Tesla announces new factory in Austin, Texas. CEO Elon Musk says this will create 10,000 new jobs.",
];

/// A ready-made playground configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Count the animals and fruits in an image.
    ImageInventory,
    /// Extract sentiment, topics and entities from text.
    TextIntent,
}

impl Preset {
    /// Every preset, in display order.
    pub const ALL: [Self; 2] = [Self::ImageInventory, Self::TextIntent];

    /// Stable identifier.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ImageInventory => "image_inventory",
            Self::TextIntent => "text_intent",
        }
    }

    /// The preset for an input mode.
    #[must_use]
    pub const fn for_mode(mode: InputMode) -> Self {
        match mode {
            InputMode::Image => Self::ImageInventory,
            InputMode::Text => Self::TextIntent,
        }
    }

    /// Which content the preset expects.
    #[must_use]
    pub const fn mode(&self) -> InputMode {
        match self {
            Self::ImageInventory => InputMode::Image,
            Self::TextIntent => InputMode::Text,
        }
    }

    /// Default instruction.
    #[must_use]
    pub const fn system_prompt(&self) -> &'static str {
        match self {
            Self::ImageInventory => IMAGE_INVENTORY_PROMPT,
            Self::TextIntent => TEXT_INTENT_PROMPT,
        }
    }

    /// Default schema-source.
    #[must_use]
    pub const fn schema(&self) -> &'static str {
        match self {
            Self::ImageInventory => IMAGE_INVENTORY_SCHEMA,
            Self::TextIntent => TEXT_INTENT_SCHEMA,
        }
    }

    /// Sample inputs to try the preset with.
    #[must_use]
    pub const fn samples(&self) -> &'static [&'static str] {
        match self {
            Self::ImageInventory => &[],
            Self::TextIntent => TEXT_INTENT_SAMPLES,
        }
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("unknown preset `{s}`"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::compile;

    #[test]
    fn test_image_inventory_schema() {
        let schema = compile(Preset::ImageInventory.schema()).unwrap();
        let counted = json!({ "type": "object", "properties": { "name": { "type": "string" }, "count": { "type": "number" } }, "required": ["name", "count"] });

        assert_eq!(
            schema.json_schema(),
            &json!({
                "type": "object",
                "properties": {
                    "isTaskRefused": { "type": "boolean" },
                    "refusalReason": { "anyOf": [{ "type": "string" }, { "type": "null" }] },
                    "animals": { "type": "array", "items": counted },
                    "fruits": { "type": "array", "items": counted }
                },
                "required": ["isTaskRefused", "refusalReason", "animals", "fruits"]
            })
        );

        assert!(schema.is_valid(&json!({
            "isTaskRefused": false,
            "refusalReason": null,
            "animals": [{ "name": "cat", "count": 2 }],
            "fruits": []
        })));
    }

    #[test]
    fn test_text_intent_schema() {
        let schema = compile(Preset::TextIntent.schema()).unwrap();
        assert_eq!(
            schema.json_schema()["properties"]["sentiment"],
            json!({ "type": "string", "enum": ["positive", "negative", "neutral"] })
        );

        let reply = json!({
            "isTaskRefused": false,
            "refusalReason": null,
            "sentiment": "positive",
            "topics": ["phones"],
            "entities": [{ "name": "Apple", "type": "organization" }]
        });
        assert!(schema.is_valid(&reply));

        let mut wrong = reply;
        wrong["sentiment"] = json!("ecstatic");
        assert!(!schema.is_valid(&wrong));
    }

    #[test]
    fn test_lookup() {
        assert_eq!("text_intent".parse::<Preset>(), Ok(Preset::TextIntent));
        assert!("nope".parse::<Preset>().is_err());
        assert_eq!(Preset::for_mode(InputMode::Image), Preset::ImageInventory);
        assert_eq!(Preset::TextIntent.samples().len(), 3);
    }
}
