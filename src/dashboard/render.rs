use std::fmt::Write;

use super::form::DashboardForm;
use crate::error::ClientError;
use crate::web::responses::SimplePredictionResponse;

pub const MODEL_LABEL: &str = "ElasticNet";

pub fn render_prediction(form: &DashboardForm, prediction: &SimplePredictionResponse) -> String {
    let price = prediction.predicted_price;
    let per_sqft = price / f64::from(form.gr_liv_area);

    let mut out = String::new();
    let _ = writeln!(out, "Prediction complete");
    let _ = writeln!(out, "  Predicted price:  {}", format_dollars(price));
    let _ = writeln!(out, "  Price per sq ft:  {}", format_dollars(per_sqft));
    let _ = writeln!(out, "  Model used:       {}", MODEL_LABEL);
    let _ = writeln!(out);
    let _ = writeln!(out, "Input summary");
    for (field, value) in form.fields() {
        let _ = writeln!(out, "  {:<14}{}", field, value);
    }
    out
}

/// One message per failure class: unreachable, rejected, anything else.
pub fn render_error(err: &ClientError) -> String {
    match err {
        ClientError::Connection { url, reason } => format!(
            "Could not connect to the prediction service at {}. Make sure it is running.\n  {}",
            url, reason
        ),
        ClientError::Status { status, message } => format!(
            "API error: could not get prediction\n  Status code: {}\n  {}",
            status, message
        ),
        ClientError::Other(message) => format!("Error: {}", message),
    }
}

/// Whole dollars with thousands separators, e.g. `$182,346`.
pub fn format_dollars(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}
