use serde::{Deserialize, Serialize};

/// A demonstration question paired with the fenced SQL answer the model should imitate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub question: String,
    pub answer: String,
}

impl FewShotExample {
    pub fn new(question: &str, sql: &str) -> Self {
        Self {
            question: question.to_string(),
            answer: format!("```sql\n{}\n```", sql),
        }
    }

    pub fn render(&self) -> String {
        format!("User: {}\nAssistant: {}\n", self.question, self.answer)
    }
}

const HIGH_VALUE_CUSTOMERS: &str = "\
SELECT COUNT(*) AS high_value_customers
FROM (
    SELECT o.customer_id, SUM(oi.price) AS total_spent
    FROM orders o
    JOIN order_items oi ON o.order_id = oi.order_id
    GROUP BY o.customer_id
    HAVING total_spent > 5000
) AS customer_totals;";

const TOP_SELLER_RIO: &str = "\
SELECT s.seller_id
FROM sellers s
JOIN order_items oi ON s.seller_id = oi.seller_id
JOIN orders o ON oi.order_id = o.order_id
JOIN customers c ON o.customer_id = c.customer_id
WHERE c.customer_city = 'rio de janeiro'
    AND o.order_status = 'delivered'
GROUP BY s.seller_id
ORDER BY COUNT(DISTINCT o.order_id) DESC
LIMIT 1;";

const PRICIEST_CATEGORY: &str = "\
SELECT p.product_category_name
FROM products p
JOIN order_items oi ON p.product_id = oi.product_id
GROUP BY p.product_category_name
ORDER BY AVG(oi.price) DESC
LIMIT 1;";

const HIGHEST_FREIGHT_CITY: &str = "\
SELECT c.customer_city
FROM customers c
JOIN orders o ON c.customer_id = o.customer_id
JOIN order_items oi ON o.order_id = oi.order_id
GROUP BY c.customer_city
ORDER BY AVG(oi.freight_value) DESC
LIMIT 1;";

/// The fixed few-shot set, in presentation order.
pub fn get_examples() -> Vec<FewShotExample> {
    vec![
        FewShotExample::new(
            "How many customers have placed orders worth more than $5000 in total?",
            HIGH_VALUE_CUSTOMERS,
        ),
        FewShotExample::new(
            "Which seller has the highest number of orders delivered to Rio de Janeiro?",
            TOP_SELLER_RIO,
        ),
        FewShotExample::new(
            "What is the most expensive product category based on average price?",
            PRICIEST_CATEGORY,
        ),
        FewShotExample::new(
            "Which city has the highest average freight value per order?",
            HIGHEST_FREIGHT_CITY,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn examples_are_stable_across_calls() {
        assert_eq!(get_examples(), get_examples());
        assert_eq!(get_examples().len(), 4);
    }

    #[test]
    fn answers_are_fenced_sql() {
        for example in get_examples() {
            assert!(example.answer.starts_with("```sql\nSELECT"));
            assert!(example.answer.ends_with("\n```"));
        }
    }

    #[test]
    fn renders_user_assistant_pair() {
        let example = FewShotExample::new("Count orders?", "SELECT COUNT(*) FROM orders;");
        assert_eq!(
            example.render(),
            "User: Count orders?\nAssistant: ```sql\nSELECT COUNT(*) FROM orders;\n```\n"
        );
    }
}
