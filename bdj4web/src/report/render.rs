//! HTML output for the install report

use crate::report::aggregate::Report;
use crate::report::record::InstallRecord;

const SUMMARY_HEADERS: [&str; 5] = ["Version", "New", "Re-Install", "Update", "Convert"];

const DETAIL_HEADERS: [&str; 13] = [
    "Version",
    "Date",
    "Country",
    "OS",
    "Python-Vers",
    "Sys-Locale",
    "Locale",
    "New",
    "Re-Install",
    "Update",
    "Convert",
    "Old-Version",
    "BDJ3-Version",
];

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

impl Align {
    fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Right => "right",
        }
    }
}

pub fn render_html(report: &Report) -> String {
    let mut html = String::from("<html>\n<head>\n</head>\n<body>\n");

    open_table(&mut html, &["Version", "Country", "Count"]);
    for summary in &report.versions {
        for (country, count) in &summary.countries {
            let count = count.to_string();
            row(
                &mut html,
                &[
                    (summary.full_version.as_str(), Align::Left),
                    (country.as_str(), Align::Left),
                    (count.as_str(), Align::Right),
                ],
            );
        }
    }
    close_table(&mut html);

    open_table(&mut html, &SUMMARY_HEADERS);
    for summary in &report.versions {
        let counts = [
            summary.new.to_string(),
            summary.reinstall.to_string(),
            summary.update.to_string(),
            summary.convert.to_string(),
        ];
        let mut cells = vec![(summary.full_version.as_str(), Align::Left)];
        cells.extend(counts.iter().map(|c| (c.as_str(), Align::Right)));
        row(&mut html, &cells);
    }
    close_table(&mut html);

    open_table(&mut html, &DETAIL_HEADERS);
    for record in &report.recent {
        detail_row(&mut html, record);
    }
    close_table(&mut html);

    html.push_str("</body>\n</html>\n");
    html
}

fn detail_row(html: &mut String, record: &InstallRecord) {
    let cells = [
        (record.full_version.as_str(), Align::Left),
        (text(&record.date), Align::Left),
        (record.country.as_str(), Align::Left),
        (text(&record.os), Align::Left),
        (text(&record.python_version), Align::Right),
        (text(&record.system_locale), Align::Right),
        (text(&record.locale), Align::Right),
        (text(&record.new), Align::Right),
        (text(&record.reinstall), Align::Right),
        (text(&record.update), Align::Right),
        (text(&record.convert), Align::Right),
        (text(&record.old_version), Align::Left),
        (text(&record.bdj3_version), Align::Left),
    ];
    row(html, &cells);
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

fn open_table(html: &mut String, headers: &[&str]) {
    html.push_str("  <p>\n  <table>\n    <tr>\n");
    for header in headers {
        html.push_str(&format!("      <th align=\"left\">{}</th>\n", header));
    }
    html.push_str("    </tr>\n");
}

fn close_table(html: &mut String) {
    html.push_str("  </table>\n  </p>\n");
}

fn row(html: &mut String, cells: &[(&str, Align)]) {
    html.push_str("    <tr>\n");
    for (value, align) in cells {
        html.push_str(&format!(
            "      <td align=\"{}\">{}</td>\n",
            align.as_str(),
            escape_html(value)
        ));
    }
    html.push_str("    </tr>\n");
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::aggregate::aggregate;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"R&B\"</b> 'x'"),
            "&lt;b&gt;&quot;R&amp;B&quot;&lt;/b&gt; &#39;x&#39;"
        );
    }

    #[test]
    fn test_empty_report() {
        let html = render_html(&Report::default());
        assert!(html.starts_with("<html>"));
        assert_eq!(html.matches("<table>").count(), 3);
        assert!(!html.contains("<td"));
    }

    #[test]
    fn test_values_are_escaped() {
        let record = InstallRecord {
            full_version: "4.0.0--".to_string(),
            os: Some("<script>".to_string()),
            ..Default::default()
        };
        let html = render_html(&aggregate(&[record]));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<th align=\"left\">BDJ3-Version</th>"));
    }
}
