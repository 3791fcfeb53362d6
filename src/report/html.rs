//! HTML rendering of a report summary, suitable for an email body.

use crate::core::{RankedSpecies, ReportSummary};

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; max-width: 1000px; margin: 0 auto; padding: 20px; }
        .species-card { border: 1px solid #ddd; border-radius: 8px; padding: 20px; margin-bottom: 20px; }
        .species-header { display: flex; gap: 20px; margin-bottom: 15px; }
        .species-image { width: 150px; height: 150px; object-fit: cover; border-radius: 8px; margin-right: 20px; }
        .species-info { flex: 1; }
        .species-name { font-size: 20px; font-weight: bold; margin-bottom: 5px; }
        .scientific-name { font-style: italic; color: #666; }
        .grid-header { display: flex; gap: 2px; margin-bottom: 4px; }
        .hour-label { width: 25px; text-align: center; font-size: 11px; color: #666; }
        .sound-link { display: inline-block; margin-top: 10px; color: #0066cc; text-decoration: none; }
"#;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the full HTML document.
pub fn render_html(summary: &ReportSummary) -> String {
    let meta = &summary.meta;
    let mut cards = String::new();
    for species in &summary.species {
        cards.push_str(&species_card(species));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>{STYLE}    </style>
</head>
<body>
    <h1>Bird Detection Report - Past {hours} Hours</h1>
    <h2>{species} Species, {detections} Total Detections</h2>
    <p>Generated on {generated} from <a href="{url}">BirdWeather station {token}</a></p>
{cards}</body>
</html>
"#,
        hours = meta.hours,
        species = summary.total_species,
        detections = summary.total_detections,
        generated = meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        url = escape(&meta.station_url),
        token = escape(&meta.station_token),
    )
}

fn species_card(species: &RankedSpecies) -> String {
    let stat = &species.stat;
    let name = escape(&stat.name);
    let mut card = String::new();

    card.push_str("    <div class=\"species-card\">\n        <div class=\"species-header\">\n");
    if let Some(image) = stat.image_url.as_deref().filter(|u| !u.is_empty()) {
        card.push_str(&format!(
            "            <img src=\"{}\" alt=\"{name}\" class=\"species-image\">\n",
            escape(image)
        ));
    }
    card.push_str(&format!(
        "            <span class=\"species-info\">\n                \
         <span class=\"species-name\"><b>{name}</b></span> -\n                \
         <span class=\"scientific-name\"><i>{}</i></span><br>\n                \
         <span>Detections: {}.</span> &nbsp;\n                \
         <span>Highest confidence: {:.1}%.</span>\n",
        escape(&stat.scientific_name),
        stat.count,
        stat.max_confidence * 100.0
    ));
    if let Some(sound) = &stat.best_soundscape {
        card.push_str(&format!(
            "                <br><a href=\"{}\" class=\"sound-link\">\n                    \
             Listen to best detection ({:.1}s - {:.1}s)\n                </a>\n",
            escape(&sound.url),
            sound.start_time,
            sound.end_time
        ));
    }
    card.push_str("            </span>\n        </div>\n        <div class=\"grid-header\">\n");

    for cell in &species.hours {
        // Colors are 8-bit, whatever cap the intensity scale uses.
        let shade = 255u32.saturating_sub(cell.intensity);
        card.push_str(&format!(
            "            <span class=\"hour-label\" style=\"background-color: rgb({shade}, 255, {shade});\" title=\"{} detections\">{}</span>\n",
            cell.count, cell.hour
        ));
    }
    card.push_str("        </div>\n    </div>\n    &nbsp;\n");
    card
}
