//! Plain-text rendering of a [`Report`].

use crate::report::Report;

const WIDTH: usize = 80;

/// Render `report` as human-readable text.
pub fn render_text(report: &Report) -> String {
    let heavy = "=".repeat(WIDTH);
    let light = "-".repeat(WIDTH);
    let mut lines: Vec<String> = Vec::new();

    lines.push(heavy.clone());
    lines.push(report.title.to_uppercase());
    lines.push(heavy);
    if let Some(recipient) = &report.recipient {
        lines.push(format!("Prepared for: {}", recipient));
    }
    lines.push(format!(
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    lines.push(format!("Relevant articles: {}", report.total_ranked));
    lines.push(format!("Articles in this report: {}", report.items.len()));
    if !report.profile.profile_text.is_empty() {
        lines.push(format!("Profile: {}", report.profile.profile_text));
    }
    if !report.profile.detected_categories.is_empty() {
        lines.push(format!(
            "Detected topics: {}",
            report.profile.detected_categories.join(", ")
        ));
    }
    lines.push(String::new());
    lines.push(report.introduction.clone());
    lines.push(light.clone());

    for item in &report.items {
        lines.push(String::new());
        lines.push(format!("{}. {}", item.rank, item.title));
        lines.push(format!("   Category: {}", item.category));
        lines.push(format!("   Relevance score: {:.3}", item.score));
        if let Some(date) = &item.published_at {
            lines.push(format!("   Date: {}", date));
        }
        lines.push(String::new());
        lines.push("   Summary:".to_string());
        lines.push(format!("   {}", item.summary.replace('\n', "\n   ")));
        if !item.matching_categories.is_empty() {
            lines.push(String::new());
            lines.push(format!(
                "   Matching categories: {}",
                item.matching_categories.join(", ")
            ));
        }
        if !item.matching_entities.is_empty() {
            lines.push(format!(
                "   Matching entities: {}",
                item.matching_entities.join(", ")
            ));
        }
        if let Some(url) = &item.url {
            lines.push(String::new());
            lines.push(format!("   URL: {}", url));
        }
        lines.push(light.clone());
    }

    if let Some(closing) = &report.closing {
        lines.push(String::new());
        lines.push(closing.clone());
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ProfileSummary, ReportItem};
    use chrono::{TimeZone, Utc};

    fn report(items: Vec<ReportItem>) -> Report {
        Report {
            id: "r-1".into(),
            title: "Personalized News Report".into(),
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            corpus_version: 3,
            recipient: Some("Ana".into()),
            introduction: "Here is the top article.".into(),
            closing: None,
            profile: ProfileSummary {
                categories: vec!["ciencia".into()],
                detected_categories: vec!["salud".into(), "tecnología".into()],
                entities: vec![],
                keywords: vec![],
                profile_text: "Selected interests: ciencia".into(),
            },
            total_ranked: 4,
            items,
        }
    }

    fn item() -> ReportItem {
        ReportItem {
            rank: 1,
            article_id: "a".into(),
            title: "Nuevo telescopio".into(),
            category: "ciencia".into(),
            url: Some("https://example.org/a".into()),
            published_at: Some("2024-04-30".into()),
            score: 0.87654,
            summary: "Primera línea.\nSegunda línea.".into(),
            matching_categories: vec!["ciencia".into()],
            matching_entities: vec!["nasa".into()],
            entities: vec![],
        }
    }

    #[test]
    fn test_render_header_and_item() {
        let text = render_text(&report(vec![item()]));
        assert!(text.starts_with(&"=".repeat(80)));
        assert!(text.contains("PERSONALIZED NEWS REPORT"));
        assert!(text.contains("Prepared for: Ana"));
        assert!(text.contains("Generated: 2024-05-01 09:30 UTC"));
        assert!(text.contains("Relevant articles: 4"));
        assert!(text.contains("Articles in this report: 1"));
        assert!(text.contains("Detected topics: salud, tecnología"));
        assert!(text.contains("1. Nuevo telescopio"));
        assert!(text.contains("Relevance score: 0.877"));
        assert!(text.contains("   Primera línea.\n   Segunda línea."));
        assert!(text.contains("Matching categories: ciencia"));
        assert!(text.contains("Matching entities: nasa"));
        assert!(text.contains("URL: https://example.org/a"));
    }

    #[test]
    fn test_render_optional_fields_omitted() {
        let mut bare = item();
        bare.url = None;
        bare.published_at = None;
        bare.matching_categories.clear();
        bare.matching_entities.clear();
        let mut r = report(vec![bare]);
        r.recipient = None;
        r.profile.detected_categories.clear();
        r.closing = Some("Hasta pronto.".into());

        let text = render_text(&r);
        assert!(!text.contains("Prepared for"));
        assert!(!text.contains("URL:"));
        assert!(!text.contains("Date:"));
        assert!(!text.contains("Detected topics"));
        assert!(!text.contains("Matching"));
        assert!(text.trim_end().ends_with("Hasta pronto."));
    }
}
