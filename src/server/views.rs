//! HTML page rendering

use std::fmt::Write;

use html_escape::encode_text;

use crate::form::{render_sidebar, FormError};
use crate::models::loader::StatusLevel;
use crate::models::{ModelError, ModelStatus, Prediction};

const STYLE: &str = "body{margin:0;font-family:sans-serif;display:flex}\
.sidebar{width:320px;min-height:100vh;padding:1rem;background:#f0f2f6;box-sizing:border-box}\
.field{margin-bottom:.75rem}.field label{display:block;font-size:.85rem;margin-bottom:.25rem}\
.field input,.field select{width:100%}\
main{flex:1;padding:1rem 2rem}\
.info{color:#0f5132}.error{color:#842029;background:#f8d7da;padding:.5rem;border-radius:4px}\
table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:.25rem .5rem;font-size:.85rem}\
.label{font-size:2rem;font-weight:bold}";

/// Result of the predict action shown in the main panel
pub enum Outcome<'a> {
    Prediction(&'a Prediction),
    Invalid(&'a FormError),
    Unavailable,
    Failed(&'a ModelError),
}

fn render_status(html: &mut String, status: &ModelStatus) {
    for message in &status.messages {
        let class = match message.level {
            StatusLevel::Info => "info",
            StatusLevel::Error => "error",
        };
        let _ = write!(html, "<p class=\"{}\">{}</p>", class, encode_text(&message.text));
    }

    if status.model.is_none() {
        html.push_str(
            "<p class=\"error\">Model is not loaded. Please check the file path or loading process.</p>",
        );
    }
}

fn render_record(html: &mut String, values: &[(&'static str, String)]) {
    html.push_str("<h3>User Input:</h3><table><tr>");
    for (name, _) in values {
        let _ = write!(html, "<th>{}</th>", encode_text(name));
    }
    html.push_str("</tr><tr>");
    for (_, value) in values {
        let _ = write!(html, "<td>{}</td>", encode_text(value));
    }
    html.push_str("</tr></table>");
}

fn render_outcome(html: &mut String, outcome: &Outcome<'_>) {
    match outcome {
        Outcome::Prediction(prediction) => {
            let _ = write!(
                html,
                "<h3>Prediction:</h3><p class=\"label\" id=\"prediction\">{}</p>",
                encode_text(&prediction.label)
            );
            if !prediction.probabilities.is_empty() {
                html.push_str("<table><tr><th>Class</th><th>Probability</th></tr>");
                for (column, p) in prediction.probabilities.iter().enumerate() {
                    let class = match &p.label {
                        Some(label) => encode_text(label).into_owned(),
                        None => format!("#{}", column),
                    };
                    let _ = write!(
                        html,
                        "<tr><td>{}</td><td>{:.3}</td></tr>",
                        class, p.probability
                    );
                }
                html.push_str("</table>");
            }
        }
        Outcome::Invalid(e) => {
            let _ = write!(
                html,
                "<p class=\"error\">Invalid input for {}: {}</p>",
                encode_text(e.field),
                encode_text(&e.message)
            );
        }
        Outcome::Unavailable => {
            html.push_str(
                "<p class=\"error\">Prediction is unavailable: no model with a predict operation is loaded.</p>",
            );
        }
        Outcome::Failed(e) => {
            let _ = write!(
                html,
                "<p class=\"error\">An error occurred while making the prediction: {}</p>",
                encode_text(&e.to_string())
            );
        }
    }
}

/// Render the whole page: sidebar form, load status, input table and the
/// outcome of the predict action, if any.
pub fn render_page(
    status: &ModelStatus,
    values: &[(&'static str, String)],
    outcome: Option<Outcome<'_>>,
) -> String {
    let mut html = String::with_capacity(16 * 1024);
    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Employee Performance Prediction</title><style>{}</style></head><body>",
        STYLE
    );

    html.push_str(&render_sidebar(values, status.can_predict()));

    html.push_str("<main><h1>Employee Performance Prediction</h1>");
    render_status(&mut html, status);
    render_record(&mut html, values);
    if let Some(outcome) = outcome {
        render_outcome(&mut html, &outcome);
    }
    html.push_str("</main></body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelLoader;
    use crate::form::record_values;
    use crate::models::ClassProbability;
    use crate::types::employee::EmployeeRecord;
    use chrono::Utc;

    fn missing_status() -> ModelStatus {
        ModelLoader::new().load_with_report("does/not/exist/rf_model.onnx")
    }

    #[test]
    fn test_missing_model_page() {
        let html = render_page(&missing_status(), &record_values(&EmployeeRecord::default()), None);

        assert!(html.contains("Model file 'does/not/exist/rf_model.onnx' not found"));
        assert!(html.contains("Model is not loaded."));
        assert!(html.contains("<button type=\"submit\" disabled>Predict</button>"));
        assert!(html.contains("<th>YearsWithCurrManager</th>"));
        assert!(!html.contains("Prediction:"));
    }

    #[test]
    fn test_prediction_page() {
        let prediction = Prediction {
            id: "p1".to_string(),
            label: "3".to_string(),
            probabilities: vec![
                ClassProbability {
                    label: None,
                    probability: 0.25,
                },
                ClassProbability {
                    label: None,
                    probability: 0.75,
                },
            ],
            model: "rf_model".to_string(),
            latency_us: 12,
            timestamp: Utc::now(),
        };
        let html = render_page(
            &missing_status(),
            &record_values(&EmployeeRecord::default()),
            Some(Outcome::Prediction(&prediction)),
        );

        assert_eq!(html.matches("id=\"prediction\"").count(), 1);
        assert!(html.contains("<p class=\"label\" id=\"prediction\">3</p>"));
        // columns without class ids are shown by position
        assert!(html.contains("<tr><td>#1</td><td>0.750</td></tr>"));
    }

    #[test]
    fn test_messages_are_escaped() {
        let error = FormError {
            field: "Gender",
            message: "'<b>' is not one of: Male, Female".to_string(),
        };
        let html = render_page(
            &missing_status(),
            &record_values(&EmployeeRecord::default()),
            Some(Outcome::Invalid(&error)),
        );

        assert!(html.contains("Invalid input for Gender: '&lt;b&gt;' is not one of: Male, Female"));
        assert!(!html.contains("<b>"));
    }
}
