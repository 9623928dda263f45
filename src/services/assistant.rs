//! Keyword intent classifier and canned answers over the dashboard data.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    config::InsightConfig,
    store::{InventoryStore, StoreResult},
};

use super::{cache::DashboardCache, insights::DashboardData};

const LISTED_ITEMS: usize = 5;
const MAX_QUESTION_CHARS: usize = 500;

const HELP_TEXT: &str = "I can help you with:\n\n- Reorder suggestions\n- Risk analysis\n- Dead stock identification\n- Fast-moving products\n- Inventory summary\n\nPlease ask a specific question about your inventory.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Reorder,
    Risk,
    DeadStock,
    FastMoving,
    Summary,
    Unknown,
}

/// Checked in order; the first rule with a matching keyword wins.
const RULES: &[(Intent, &[&str])] = &[
    (
        Intent::Reorder,
        &["reorder", "order", "buy", "purchase", "stock up"],
    ),
    (
        Intent::Risk,
        &["risk", "low stock", "running out", "stockout", "almost empty"],
    ),
    (
        Intent::DeadStock,
        &["dead", "not selling", "slow moving", "stagnant", "unused"],
    ),
    (
        Intent::FastMoving,
        &["fast", "best", "top", "popular", "selling well", "high demand"],
    ),
    (
        Intent::Summary,
        &["summary", "overview", "status", "how", "doing"],
    ),
];

pub fn classify(question: &str) -> Intent {
    let q = question.trim().to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| q.contains(k)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown)
}

/// Checks the question is non-empty and at most 500 characters.
pub fn validate_question(question: &str) -> Result<(), &'static str> {
    if question.is_empty() {
        return Err("Question is required");
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err("Question too long");
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantReply {
    pub intent: Intent,
    pub answer: String,
    pub data: Value,
}

fn days(value: Option<f64>) -> String {
    match value {
        Some(d) => d.to_string(),
        None => "unknown".to_string(),
    }
}

fn more_marker(total: usize) -> &'static str {
    if total > LISTED_ITEMS {
        "\n\n...and more"
    } else {
        ""
    }
}

fn empty_list(intent: Intent, answer: &str) -> AssistantReply {
    AssistantReply {
        intent,
        answer: answer.to_string(),
        data: json!({ "count": 0, "items": [] }),
    }
}

/// Renders the answer for `intent`. `Unknown` ignores `data`.
pub fn respond(intent: Intent, data: &DashboardData, config: &InsightConfig) -> AssistantReply {
    match intent {
        Intent::Reorder => {
            let items = &data.reorder_suggestions;
            if items.is_empty() {
                return empty_list(
                    intent,
                    "You don't need to reorder anything today. All stock levels are healthy.",
                );
            }
            let lines: Vec<String> = items
                .iter()
                .take(LISTED_ITEMS)
                .map(|item| {
                    format!(
                        "- {} (SKU: {}): Reorder {} units ({} days left)",
                        item.name,
                        item.sku,
                        item.suggested_reorder_qty,
                        days(item.days_left)
                    )
                })
                .collect();
            AssistantReply {
                intent,
                answer: format!(
                    "You should reorder {} products today:\n\n{}{}",
                    items.len(),
                    lines.join("\n"),
                    more_marker(items.len())
                ),
                data: json!({ "count": items.len(), "items": items }),
            }
        }
        Intent::Risk => {
            let items = &data.low_stock_items;
            if items.is_empty() {
                return empty_list(
                    intent,
                    "No products are currently at risk. All stock levels are adequate.",
                );
            }
            let critical: Vec<_> = items
                .iter()
                .filter(|item| matches!(item.days_left, Some(d) if d <= config.low_days_left))
                .collect();
            let lines: Vec<String> = critical
                .iter()
                .take(LISTED_ITEMS)
                .map(|item| {
                    format!(
                        "- {} (SKU: {}): {} units left, {} days remaining",
                        item.name,
                        item.sku,
                        item.current_stock,
                        days(item.days_left)
                    )
                })
                .collect();
            AssistantReply {
                intent,
                answer: format!(
                    "{} products are at risk of running out:\n\n{}{}",
                    items.len(),
                    lines.join("\n"),
                    more_marker(critical.len())
                ),
                data: json!({
                    "count": items.len(),
                    "critical": critical.len(),
                    "items": items,
                }),
            }
        }
        Intent::DeadStock => {
            let items = &data.dead_stock_items;
            if items.is_empty() {
                return empty_list(
                    intent,
                    "No dead stock detected. All products are selling regularly.",
                );
            }
            let lines: Vec<String> = items
                .iter()
                .take(LISTED_ITEMS)
                .map(|item| {
                    format!(
                        "- {} (SKU: {}): {} units, {} days since last sale",
                        item.name, item.sku, item.current_stock, item.days_since_last_sale
                    )
                })
                .collect();
            AssistantReply {
                intent,
                answer: format!(
                    "{} products are dead stock:\n\n{}{}",
                    items.len(),
                    lines.join("\n"),
                    more_marker(items.len())
                ),
                data: json!({ "count": items.len(), "items": items }),
            }
        }
        Intent::FastMoving => {
            let items = &data.fast_moving_items;
            if items.is_empty() {
                return empty_list(
                    intent,
                    "No fast-moving products identified yet. Need more sales data.",
                );
            }
            let lines: Vec<String> = items
                .iter()
                .take(LISTED_ITEMS)
                .map(|item| {
                    format!(
                        "- {} (SKU: {}): {:.1} units/day average",
                        item.name, item.sku, item.avg_daily_sales
                    )
                })
                .collect();
            AssistantReply {
                intent,
                answer: format!(
                    "Your top {} fast-moving products:\n\n{}{}",
                    items.len(),
                    lines.join("\n"),
                    more_marker(items.len())
                ),
                data: json!({ "count": items.len(), "items": items }),
            }
        }
        Intent::Summary => {
            let summary = &data.summary;
            let status = if summary.low_stock_count == 0 {
                "Healthy ✓"
            } else {
                "Needs attention"
            };
            AssistantReply {
                intent,
                answer: format!(
                    "Inventory Summary:\n\n- Total Products: {}\n- Total Stock: {} units\n- Low Stock Alerts: {}\n- Dead Stock Items: {}\n\nOverall status: {}",
                    summary.total_products,
                    summary.total_stock,
                    summary.low_stock_count,
                    summary.dead_stock_count,
                    status
                ),
                data: json!(summary),
            }
        }
        Intent::Unknown => AssistantReply {
            intent,
            answer: HELP_TEXT.to_string(),
            data: Value::Null,
        },
    }
}

/// Classifies the question and answers it from the store's (possibly cached)
/// dashboard. Unknown questions are answered without aggregating.
pub async fn answer(
    store: &dyn InventoryStore,
    cache: &DashboardCache,
    store_id: Uuid,
    question: &str,
    config: &InsightConfig,
    now: DateTime<Utc>,
) -> StoreResult<AssistantReply> {
    let intent = classify(question);
    log::debug!("assistant question for store {} classified as {:?}", store_id, intent);
    if intent == Intent::Unknown {
        return Ok(respond(intent, &DashboardData::default(), config));
    }
    let data = cache.get_or_load(store, store_id, config, now).await?;
    Ok(respond(intent, &data, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::insights::{
        DashboardSummary, DeadStockItem, FastMovingItem, LowStockItem, LowStockReason,
        ReorderSuggestion,
    };

    fn reorder(name: &str, days_left: Option<f64>) -> ReorderSuggestion {
        ReorderSuggestion {
            product_id: Uuid::new_v4(),
            name: name.to_string(),
            sku: format!("SKU-{}", name),
            current_stock: 4,
            avg_daily_sales: 2.0,
            days_left,
            suggested_reorder_qty: 19,
        }
    }

    #[test]
    fn classifies_by_first_matching_rule() {
        assert_eq!(classify("What should I REORDER?"), Intent::Reorder);
        assert_eq!(classify("Which items are at risk?"), Intent::Risk);
        assert_eq!(classify("show me dead items"), Intent::DeadStock);
        assert_eq!(classify("what is popular"), Intent::FastMoving);
        assert_eq!(classify("give me an overview"), Intent::Summary);
        assert_eq!(classify("tell me a joke"), Intent::Unknown);
    }

    #[test]
    fn earlier_rules_take_priority() {
        // "stock up" and "running out" both present; reorder comes first.
        assert_eq!(classify("stock up before running out"), Intent::Reorder);
        // "top" also matches, but "dead" is checked earlier.
        assert_eq!(classify("top dead products"), Intent::DeadStock);
        // "how" is summary, "low stock" is risk.
        assert_eq!(classify("how much low stock"), Intent::Risk);
    }

    #[test]
    fn intent_serializes_lowercase() {
        assert_eq!(json!(Intent::DeadStock), json!("deadstock"));
        assert_eq!(json!(Intent::FastMoving), json!("fastmoving"));
    }

    #[test]
    fn question_length_is_bounded() {
        assert!(validate_question("").is_err());
        assert!(validate_question("status?").is_ok());
        assert!(validate_question(&"a".repeat(500)).is_ok());
        assert!(validate_question(&"a".repeat(501)).is_err());
    }

    #[test]
    fn reorder_lists_top_five_and_marks_truncation() {
        let mut data = DashboardData::default();
        data.reorder_suggestions = (0..7).map(|i| reorder(&format!("P{}", i), Some(2.5))).collect();

        let reply = respond(Intent::Reorder, &data, &InsightConfig::default());
        assert!(reply.answer.starts_with("You should reorder 7 products today:"));
        assert!(reply.answer.contains("- P0 (SKU: SKU-P0): Reorder 19 units (2.5 days left)"));
        assert!(reply.answer.contains("P4"));
        assert!(!reply.answer.contains("P5"));
        assert!(reply.answer.ends_with("...and more"));
        assert_eq!(reply.data["count"], 7);
        assert_eq!(reply.data["items"].as_array().map(Vec::len), Some(7));
    }

    #[test]
    fn empty_lists_produce_reassuring_answers() {
        let data = DashboardData::default();
        let config = InsightConfig::default();
        for intent in [Intent::Reorder, Intent::Risk, Intent::DeadStock, Intent::FastMoving] {
            let reply = respond(intent, &data, &config);
            assert_eq!(reply.data, json!({ "count": 0, "items": [] }));
            assert!(!reply.answer.is_empty());
        }
    }

    #[test]
    fn risk_counts_critical_items() {
        let mut data = DashboardData::default();
        let low = |name: &str, days_left: Option<f64>| LowStockItem {
            product_id: Uuid::new_v4(),
            name: name.to_string(),
            sku: name.to_uppercase(),
            current_stock: 3,
            reorder_point: 10,
            days_left,
            reason: LowStockReason::BelowReorderPoint,
        };
        data.low_stock_items = vec![low("milk", Some(1.5)), low("salt", None), low("oil", Some(8.0))];

        let reply = respond(Intent::Risk, &data, &InsightConfig::default());
        assert_eq!(reply.data["count"], 3);
        assert_eq!(reply.data["critical"], 1);
        assert!(reply.answer.contains("- milk (SKU: MILK): 3 units left, 1.5 days remaining"));
        assert!(!reply.answer.contains("salt"));
    }

    #[test]
    fn dead_and_fast_lists_render_item_lines() {
        let mut data = DashboardData::default();
        data.dead_stock_items = vec![DeadStockItem {
            product_id: Uuid::new_v4(),
            name: "Candles".into(),
            sku: "CDL".into(),
            current_stock: 9,
            days_since_last_sale: 30,
        }];
        data.fast_moving_items = vec![FastMovingItem {
            product_id: Uuid::new_v4(),
            name: "Bread".into(),
            sku: "BRD".into(),
            current_stock: 40,
            avg_daily_sales: 6.4,
            last_sale_at: None,
        }];
        let config = InsightConfig::default();

        let dead = respond(Intent::DeadStock, &data, &config);
        assert!(dead.answer.contains("- Candles (SKU: CDL): 9 units, 30 days since last sale"));

        let fast = respond(Intent::FastMoving, &data, &config);
        assert!(fast.answer.contains("- Bread (SKU: BRD): 6.4 units/day average"));
    }

    #[test]
    fn summary_reports_health() {
        let mut data = DashboardData {
            summary: DashboardSummary {
                total_products: 4,
                total_stock: 120,
                low_stock_count: 0,
                dead_stock_count: 1,
            },
            ..DashboardData::default()
        };
        let config = InsightConfig::default();

        let reply = respond(Intent::Summary, &data, &config);
        assert!(reply.answer.contains("- Total Stock: 120 units"));
        assert!(reply.answer.ends_with("Overall status: Healthy ✓"));
        assert_eq!(reply.data["totalProducts"], 4);

        data.summary.low_stock_count = 2;
        let reply = respond(Intent::Summary, &data, &config);
        assert!(reply.answer.ends_with("Overall status: Needs attention"));
    }

    #[tokio::test]
    async fn unknown_question_skips_store_lookup() {
        let store = crate::store::MemoryStore::new();
        let cache = DashboardCache::new(std::time::Duration::from_secs(60));
        // The store id does not exist; aggregation would fail with NotFound.
        let reply = answer(
            &store,
            &cache,
            Uuid::new_v4(),
            "tell me a joke",
            &InsightConfig::default(),
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(reply.intent, Intent::Unknown);
        assert_eq!(reply.data, Value::Null);
        assert!(reply.answer.starts_with("I can help you with:"));
    }
}
