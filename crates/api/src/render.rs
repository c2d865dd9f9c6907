use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{html, Event, Options, Parser};
use triage_core::{NextAction, TriageRecord, DISCLAIMER};

const TITLE: &str = "TriageAI: Symptom Router";

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem;line-height:1.5}\
label{display:block;margin-top:1rem;font-weight:600}\
input[type=text]{width:100%;padding:.5rem;font-size:1rem}\
button{margin-top:1rem;padding:.5rem 1.25rem;font-size:1rem}\
.warning{background:#fff4ce;border:1px solid #e0b400;padding:.75rem;margin-top:1rem}\
.error{background:#fde7e9;border:1px solid #c50f1f;padding:.75rem;margin-top:1rem}\
.notice{background:#e6f4ea;border:1px solid #1e8e3e;padding:.75rem;margin-top:1rem}\
.pre{white-space:pre-line}\
.disclaimer{margin-top:2rem;font-size:.85rem;font-style:italic;color:#555}";

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>🤖 {TITLE}</h1>\n{body}</body>\n</html>\n"
    )
}

/// Symptom and city inputs. `warning` is shown above the form when a
/// previous submission was rejected.
pub fn form_page(symptom: &str, city: &str, warning: Option<&str>) -> String {
    let mut body = String::new();

    if let Some(warning) = warning {
        let _ = writeln!(body, "<div class=\"warning\">{}</div>", encode_text(warning));
    }

    let _ = write!(
        body,
        "<form method=\"post\" action=\"/triage\">\n\
         <label for=\"symptom\">Enter your symptom:</label>\n\
         <input type=\"text\" id=\"symptom\" name=\"symptom\" value=\"{}\" autofocus>\n\
         <label for=\"city\">Enter your city/state:</label>\n\
         <input type=\"text\" id=\"city\" name=\"city\" value=\"{}\">\n\
         <button type=\"submit\">Submit</button>\n\
         </form>\n",
        encode_double_quoted_attribute(symptom),
        encode_double_quoted_attribute(city),
    );

    layout(&body)
}

pub fn result_page(record: &TriageRecord) -> String {
    let mut body = String::new();

    section(&mut body, "Diagnosis", &record.answer);
    section(&mut body, "Advice", &record.advice);
    section(&mut body, "Diet Suggestion", &record.diet);

    let _ = write!(
        body,
        "<h2>Recommended Doctors &amp; Hospitals</h2>\n\
         <details>\n<summary>Show details</summary>\n{}</details>\n",
        markdown_to_html(&record.follow_up)
    );

    body.push_str("<h2>Next action</h2>\n");
    body.push_str(&next_action_form());
    disclaimer(&mut body);
    new_triage_link(&mut body);

    layout(&body)
}

pub fn next_action_page(action: NextAction) -> String {
    let mut body = String::new();
    let class = match action {
        NextAction::SpeakToDoctor => "notice",
        NextAction::SeeHospitals | NextAction::Exit => "pre",
    };

    let _ = writeln!(
        body,
        "<h2>Next action</h2>\n<div class=\"{class}\">{}</div>",
        encode_text(action.message())
    );
    disclaimer(&mut body);
    new_triage_link(&mut body);

    layout(&body)
}

pub fn failure_page() -> String {
    let mut body = String::new();
    body.push_str(
        "<div class=\"error\">Something went wrong while preparing your triage. Please try again.</div>\n",
    );
    new_triage_link(&mut body);
    layout(&body)
}

pub fn message_page(message: &str) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<div class=\"warning\">{}</div>", encode_text(message));
    new_triage_link(&mut body);
    layout(&body)
}

/// Model output is trusted for structure only. Raw HTML in it is shown as text.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn section(body: &mut String, heading: &str, text: &str) {
    let _ = writeln!(
        body,
        "<h2>{}</h2>\n<p class=\"pre\">{}</p>",
        encode_text(heading),
        encode_text(text)
    );
}

fn next_action_form() -> String {
    let mut form = String::from(
        "<form method=\"post\" action=\"/next-action\">\n<p>What would you like to do next?</p>\n",
    );
    for (index, action) in NextAction::ALL.iter().enumerate() {
        let checked = if index == 0 { " checked" } else { "" };
        let _ = writeln!(
            form,
            "<label><input type=\"radio\" name=\"choice\" value=\"{}\"{checked}> {}</label>",
            action.code(),
            encode_text(action.label())
        );
    }
    form.push_str("<button type=\"submit\">Continue</button>\n</form>\n");
    form
}

fn disclaimer(body: &mut String) {
    let _ = writeln!(
        body,
        "<p class=\"disclaimer\">⚠️ {}</p>",
        encode_text(DISCLAIMER)
    );
}

fn new_triage_link(body: &mut String) {
    body.push_str("<p><a href=\"/\">Start a new triage</a></p>\n");
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use triage_core::{Branch, SymptomCategory};

    use super::*;

    fn record() -> TriageRecord {
        TriageRecord {
            symptom: "<b>cough</b>".to_string(),
            city: "Mumbai".to_string(),
            category: "general".to_string(),
            classification: SymptomCategory::General,
            branch: Branch::General,
            answer: "'<b>cough</b>' seems general. We'll connect you to the General department."
                .to_string(),
            advice: "Please rest and monitor your symptoms.".to_string(),
            diet: "Diet Suggestion: warm fluids".to_string(),
            follow_up: "### Specialist\nPulmonologist\n\n### Hospitals\n- Lilavati Hospital, Bandra – Chest Medicine"
                .to_string(),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn result_page_has_all_sections() {
        let page = result_page(&record());
        for heading in [
            "<h2>Diagnosis</h2>",
            "<h2>Advice</h2>",
            "<h2>Diet Suggestion</h2>",
            "<h2>Recommended Doctors &amp; Hospitals</h2>",
            "<h2>Next action</h2>",
        ] {
            assert!(page.contains(heading), "missing {heading}");
        }
        assert!(page.contains("<details>"));
        assert!(page.contains("certified professionals"));
    }

    #[test]
    fn user_text_is_escaped() {
        let page = result_page(&record());
        assert!(!page.contains("<b>cough</b>"));
        assert!(page.contains("&lt;b&gt;cough&lt;/b&gt;"));
    }

    #[test]
    fn follow_up_markdown_is_rendered() {
        let html = markdown_to_html("### Hospitals\n- Kokilaben Hospital, Andheri");
        assert!(html.contains("<h3>Hospitals</h3>"));
        assert!(html.contains("<li>Kokilaben Hospital, Andheri</li>"));
    }

    #[test]
    fn raw_html_in_markdown_is_neutralized() {
        let html = markdown_to_html("<script>alert(1)</script>\n\nok");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn form_page_prefills_city_and_shows_warning() {
        let page = form_page("", "Mumbai", Some("Please enter both symptom and city."));
        assert!(page.contains("value=\"Mumbai\""));
        assert!(page.contains("class=\"warning\""));
    }

    #[test]
    fn next_action_form_lists_three_choices() {
        let form = next_action_form();
        assert_eq!(form.matches("type=\"radio\"").count(), 3);
        assert!(form.contains("value=\"see_hospitals\""));
    }
}
