//! Interaction log summary sent to the backend when the form is submitted.

use crate::models::InteractionRecord;

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// Render the record as the fixed multi-line "HCP Interaction Log" text
pub fn build_interaction_log(record: &InteractionRecord) -> String {
    let text = format!(
        "
📝 HCP Interaction Log:

🔹 Interaction Details:
• HCP Name: {hcp_name}
• Type: {interaction_type}
• Date: {date}
• Time: {time}
• Attendees: {attendees}
• Topics: {topics}

🔹 Materials & Samples:
• Materials Shared: {materials}
• Samples Distributed: {samples}

🔹 HCP Sentiment: {sentiment}

🔹 Outcomes & Follow-up:
• Outcomes: {outcomes}
• Follow-up Actions: {follow_ups}

🤖 AI Description: {description}
    ",
        hcp_name = record.hcp_name,
        interaction_type = record.interaction_type,
        date = record.date,
        time = record.time,
        attendees = record.attendees,
        topics = record.topics_discussed,
        materials = join_or_none(&record.materials_shared),
        samples = join_or_none(&record.samples_distributed),
        sentiment = record.hcp_sentiment,
        outcomes = record.outcomes,
        follow_ups = record.follow_up_actions,
        description = record.ai_description,
    );
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InteractionType, Sentiment};

    #[test]
    fn test_default_record_summary() {
        let summary = build_interaction_log(&InteractionRecord::default());
        assert!(summary.starts_with("📝 HCP Interaction Log:"));
        assert!(summary.contains("• Type: meeting"));
        assert!(summary.contains("• Materials Shared: None"));
        assert!(summary.contains("• Samples Distributed: None"));
        assert!(summary.contains("🔹 HCP Sentiment: neutral"));
        assert!(summary.ends_with("🤖 AI Description:"));
    }

    #[test]
    fn test_filled_record_summary() {
        let record = InteractionRecord {
            hcp_name: "Dr. Smith".to_string(),
            interaction_type: InteractionType::Call,
            date: "2025-03-14".to_string(),
            time: "12:05".to_string(),
            materials_shared: vec!["Product Brochure".to_string(), "PDF Document".to_string()],
            samples_distributed: vec!["Trial Pack".to_string()],
            hcp_sentiment: Sentiment::Positive,
            follow_up_actions: "Send OncoBoost Phase III PDF".to_string(),
            ai_description: "Called Dr. Smith".to_string(),
            ..Default::default()
        };

        let summary = build_interaction_log(&record);

        assert!(summary.contains("• HCP Name: Dr. Smith"));
        assert!(summary.contains("• Type: call"));
        assert!(summary.contains("• Date: 2025-03-14"));
        assert!(summary.contains("• Time: 12:05"));
        assert!(summary.contains("• Materials Shared: Product Brochure, PDF Document"));
        assert!(summary.contains("• Samples Distributed: Trial Pack"));
        assert!(summary.contains("🔹 HCP Sentiment: positive"));
        assert!(summary.contains("• Follow-up Actions: Send OncoBoost Phase III PDF"));
        assert!(summary.ends_with("🤖 AI Description: Called Dr. Smith"));
    }

    #[test]
    fn test_section_order() {
        let summary = build_interaction_log(&InteractionRecord::default());
        let details = summary.find("Interaction Details").unwrap();
        let materials = summary.find("Materials & Samples").unwrap();
        let outcomes = summary.find("Outcomes & Follow-up").unwrap();
        assert!(details < materials && materials < outcomes);
    }
}
