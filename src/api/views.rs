use crate::config::UiConfig;
use crate::ml::Prediction;
use crate::models::{Feature, RiskLabel, FEATURE_COUNT};

/// What to show under the form after a submit
#[derive(Debug, Clone)]
pub enum Outcome {
    Verdict(Prediction<RiskLabel>),
    Invalid(String),
}

/// Raw field values echoed back into the inputs, in canonical order
pub type FormValues = [String; FEATURE_COUNT];

/// Initial input values: each field's minimum
pub fn default_values() -> FormValues {
    Feature::ALL.map(|feature| match feature.step() {
        "0.1" => format!("{:.1}", feature.minimum()),
        "0.01" => format!("{:.2}", feature.minimum()),
        _ => format!("{}", feature.minimum()),
    })
}

pub fn render_page(ui: &UiConfig, values: &FormValues, outcome: Option<&Outcome>) -> String {
    let fields: String = Feature::ALL
        .iter()
        .zip(values.iter())
        .map(|(feature, value)| {
            format!(
                r#"
      <label for="{name}">{label}
        <input type="number" id="{name}" name="{name}" min="{min}" step="{step}" value="{value}" title="{help}" required>
        <small>{help}</small>
      </label>"#,
                name = feature.field_name(),
                label = escape(feature.label()),
                min = feature.minimum(),
                step = feature.step(),
                value = escape(value),
                help = escape(feature.help()),
            )
        })
        .collect();

    let result = match outcome {
        Some(Outcome::Verdict(prediction)) => render_verdict(prediction),
        Some(Outcome::Invalid(message)) => format!(
            r#"<section class="result invalid" role="alert"><p>{}</p></section>"#,
            escape(message)
        ),
        None => String::new(),
    };

    let background = ui
        .background_image
        .as_deref()
        .map(|image| {
            format!(
                "body {{ background-image: url(\"/assets/{}\"); background-size: cover; background-position: center; background-attachment: fixed; }}",
                escape(image)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Diabetes Predictor</title>
  <style>
    body {{ font-family: sans-serif; margin: 0; background-color: #1e2a38; color: #fff; }}
    {background}
    main {{ max-width: 720px; margin: 2rem auto; padding: 1.5rem; background: rgba(0, 0, 0, 0.55); border-radius: 8px; }}
    h1 {{ text-align: center; color: #FFD700; }}
    h4 {{ text-align: center; }}
    form {{ display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; }}
    label {{ display: flex; flex-direction: column; font-weight: bold; }}
    small {{ font-weight: normal; opacity: 0.8; }}
    button {{ grid-column: 1 / -1; background-color: #FF4B4B; color: #fff; font-weight: bold; border: none; border-radius: 8px; padding: 10px 24px; }}
    .result {{ margin-top: 1.5rem; padding: 1rem; border-radius: 8px; }}
    .high {{ background: #8b1e1e; }}
    .low {{ background: #1e6b34; }}
    .invalid {{ background: #7a5a00; }}
  </style>
</head>
<body>
  <main>
    <h1>{title}</h1>
    <h4>{subtitle}</h4>
    <hr>
    <h3>Enter Your Health Parameters</h3>
    <form method="post" action="/predict">{fields}
      <button type="submit">Predict My Diabetes Risk</button>
    </form>
    {result}
  </main>
</body>
</html>
"#,
        background = background,
        title = escape(&ui.title),
        subtitle = escape(&ui.subtitle),
        fields = fields,
        result = result,
    )
}

fn render_verdict(prediction: &Prediction<RiskLabel>) -> String {
    let class = if prediction.value.is_high() { "high" } else { "low" };
    format!(
        r#"<section class="result {class}" role="status"><h2>{headline}</h2><p>{advice}</p></section>"#,
        class = class,
        headline = prediction.value.headline(),
        advice = escape(prediction.value.advice()),
    )
}

/// Minimal HTML escaping for text and attribute values
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
