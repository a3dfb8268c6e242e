//! Secondary artifacts derived from a written `.pptx`.
//!
//! * PDF is delegated to an office converter (`soffice` by default) run as a
//!   child process. A missing binary is [`ExportError::Unavailable`].
//! * HTML is a single self-contained file: inline CSS and JS, images as data
//!   URIs, no external references.
//!
//! Both write next to the deck with the same base name. Failures are returned
//! as values and never undo the `.pptx`.

use crate::error::ExportError;
use crate::outline::{Bullet, SlidePayload};
use crate::output::ExportOutcome;
use crate::render::Presentation;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Secondary output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Html,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
        }
    }

    pub fn all() -> [ExportFormat; 2] {
        [ExportFormat::Pdf, ExportFormat::Html]
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "html" | "htm" => Ok(ExportFormat::Html),
            other => Err(format!("unknown export format '{other}' (expected pdf or html)")),
        }
    }
}

/// Run every requested export in order and record each outcome.
pub async fn run_exports(
    pres: &Presentation,
    pptx_path: &Path,
    formats: &[ExportFormat],
    converter: &str,
) -> Vec<ExportOutcome> {
    let mut outcomes = Vec::with_capacity(formats.len());
    for &format in formats {
        let result = match format {
            ExportFormat::Pdf => export_pdf(pptx_path, converter).await,
            ExportFormat::Html => export_html(pres, &pptx_path.with_extension("html")).await,
        };
        match &result {
            Ok(path) => info!("Exported {} → {}", format, path.display()),
            Err(e) => warn!("{}", e),
        }
        outcomes.push(ExportOutcome::from_result(format, result));
    }
    outcomes
}

// ── PDF ──────────────────────────────────────────────────────────────────

/// Convert `pptx_path` to PDF with `converter --headless --convert-to pdf`.
pub async fn export_pdf(pptx_path: &Path, converter: &str) -> Result<PathBuf, ExportError> {
    let fail = |detail: String| ExportError::Failed {
        format: "pdf".into(),
        detail,
    };
    let out_dir = match pptx_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let output = tokio::process::Command::new(converter)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(&out_dir)
        .arg(pptx_path)
        .kill_on_drop(true)
        .output()
        .await;

    let output = match output {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExportError::Unavailable {
                format: "pdf".into(),
                detail: format!("'{converter}' not found on PATH; install LibreOffice to enable PDF export"),
            });
        }
        Err(e) => return Err(fail(format!("could not start '{converter}': {e}"))),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(fail(format!(
            "'{converter}' exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let stem = pptx_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "presentation".into());
    let pdf = out_dir.join(format!("{stem}.pdf"));
    if !pdf.is_file() {
        return Err(fail(format!("converter reported success but {} is missing", pdf.display())));
    }
    Ok(pdf)
}

// ── HTML ─────────────────────────────────────────────────────────────────

const STYLE: &str = r#"
*{box-sizing:border-box;margin:0;padding:0}
html,body{height:100%;background:#111}
.deck{position:relative;width:100vw;height:100vh;overflow:hidden}
.slide{position:absolute;inset:0;margin:auto;width:min(100vw,177.78vh);height:min(56.25vw,100vh);display:none;flex-direction:column;padding:4% 5%;background:var(--bg);color:var(--text);font-family:var(--body)}
.slide.active{display:flex}
.slide h1,.slide h2{font-family:var(--title);color:var(--primary);margin-bottom:3%}
.slide h1{font-size:3.2vw}.slide h2{font-size:2.4vw}
.slide.banner{justify-content:center;align-items:center;text-align:center;background:var(--primary);color:var(--on-accent)}
.slide.banner h1,.slide.banner h2{color:var(--on-accent)}
.slide.section{background:var(--accent)}
.slide ul,.slide ol{font-size:1.6vw;line-height:1.5;padding-left:2.5vw}
.slide li.l1{margin-left:2.5vw;font-size:0.9em}.slide li.l2{margin-left:5vw;font-size:0.8em}
.cols{display:flex;gap:4%;flex:1}.cols>div{flex:1}
.cols h3{background:var(--secondary);color:var(--on-accent);padding:0.5vw 1vw;margin-bottom:1vw;font-size:1.6vw}
pre{background:rgba(127,127,127,0.12);padding:1.5vw;font:1.2vw Consolas,monospace;overflow:auto;flex:1;white-space:pre}
table{border-collapse:collapse;font-size:1.3vw;width:100%}
th{background:var(--primary);color:var(--on-accent);text-align:left}
th,td{padding:0.5vw 0.8vw;border:1px solid rgba(127,127,127,0.3)}
tr:nth-child(even) td{background:rgba(127,127,127,0.08)}
.chart-kind{font-size:1vw;opacity:0.7;margin-bottom:0.5vw}
figure{flex:1;display:flex;align-items:center;justify-content:center;min-height:0}
figure img{max-width:100%;max-height:100%}
.counter{position:fixed;bottom:1vh;right:1.5vw;color:#aaa;font:12px sans-serif}
"#;

const SCRIPT: &str = r#"
(function(){
var s=document.querySelectorAll('.slide'),i=0,c=document.querySelector('.counter');
function show(n){if(!s.length)return;s[i].classList.remove('active');i=Math.max(0,Math.min(s.length-1,n));s[i].classList.add('active');c.textContent=(i+1)+' / '+s.length;}
document.addEventListener('keydown',function(e){
if(['ArrowRight','PageDown',' ','Enter'].indexOf(e.key)>=0){show(i+1);e.preventDefault();}
else if(['ArrowLeft','PageUp','Backspace'].indexOf(e.key)>=0){show(i-1);e.preventDefault();}
else if(e.key==='Home'){show(0);}else if(e.key==='End'){show(s.length-1);}
});
document.addEventListener('click',function(e){show(e.clientX<window.innerWidth/3?i-1:i+1);});
show(0);
})();
"#;

/// Write `pres` as a self-contained HTML slideshow at `path`.
pub async fn export_html(pres: &Presentation, path: &Path) -> Result<PathBuf, ExportError> {
    let html = render_html(pres);
    tokio::fs::write(path, html).await.map_err(|e| ExportError::Failed {
        format: "html".into(),
        detail: format!("cannot write {}: {e}", path.display()),
    })?;
    Ok(path.to_path_buf())
}

/// HTML document for `pres`.
pub fn render_html(pres: &Presentation) -> String {
    let theme = pres.theme();
    let mut out = String::with_capacity(8 * 1024);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!("<title>{}</title>\n<style>", esc(pres.title())));
    out.push_str(&css_vars(theme));
    out.push_str(STYLE);
    out.push_str("</style>\n</head>\n<body>\n<div class=\"deck\">\n");

    for (i, slide) in pres.slides().iter().enumerate() {
        out.push_str(&slide_html(i + 1, &slide.spec.title, &slide.spec.payload));
    }

    out.push_str("</div>\n<div class=\"counter\"></div>\n<script>");
    out.push_str(SCRIPT);
    out.push_str("</script>\n</body>\n</html>\n");
    out
}

fn css_vars(theme: &Theme) -> String {
    format!(
        ":root{{--bg:#{};--primary:#{};--secondary:#{};--accent:#{};--text:#{};--on-accent:#{};--title:'{}',sans-serif;--body:'{}',sans-serif}}",
        theme.background,
        theme.primary,
        theme.secondary,
        theme.accent,
        theme.text,
        theme.on_accent,
        theme.title_font,
        theme.body_font
    )
}

fn slide_html(number: usize, title: &str, payload: &SlidePayload) -> String {
    let t = esc(title);
    let body = match payload {
        SlidePayload::Title { subtitle } | SlidePayload::ThankYou { subtitle } => {
            return format!(
                "<section class=\"slide banner\" id=\"s{number}\"><h1>{t}</h1><p>{}</p></section>\n",
                esc(subtitle)
            );
        }
        SlidePayload::Section { subtitle } => {
            let sub = subtitle
                .as_deref()
                .map(|s| format!("<p>{}</p>", esc(s)))
                .unwrap_or_default();
            return format!("<section class=\"slide banner section\" id=\"s{number}\"><h1>{t}</h1>{sub}</section>\n");
        }
        SlidePayload::Content { bullets } => bullet_list(bullets),
        SlidePayload::Agenda { items } => {
            let li: String = items.iter().map(|i| format!("<li>{}</li>", esc(i))).collect();
            format!("<ol>{li}</ol>")
        }
        SlidePayload::Comparison {
            left_title,
            left,
            right_title,
            right,
        } => {
            let col = |heading: &str, items: &[Bullet]| {
                let h = if heading.is_empty() {
                    String::new()
                } else {
                    format!("<h3>{}</h3>", esc(heading))
                };
                format!("<div>{h}{}</div>", bullet_list(items))
            };
            format!("<div class=\"cols\">{}{}</div>", col(left_title, left), col(right_title, right))
        }
        SlidePayload::Code { code, language } => {
            let class = language
                .as_deref()
                .map(|l| format!(" class=\"language-{}\"", esc(l)))
                .unwrap_or_default();
            format!("<pre><code{class}>{}</code></pre>", esc(code))
        }
        SlidePayload::Table(table) => table_html(&table.headers, &table.rows),
        SlidePayload::Chart(chart) => {
            let mut headers = vec![String::new()];
            headers.extend(chart.series.iter().map(|s| s.name.clone()));
            let rows: Vec<Vec<String>> = chart
                .categories
                .iter()
                .enumerate()
                .map(|(i, cat)| {
                    let mut row = vec![cat.clone()];
                    row.extend(
                        chart
                            .series
                            .iter()
                            .map(|s| s.values.get(i).map(|v| v.to_string()).unwrap_or_default()),
                    );
                    row
                })
                .collect();
            format!(
                "<div class=\"chart-kind\">{} chart</div>{}",
                chart.shape,
                table_html(&headers, &rows)
            )
        }
        SlidePayload::Image(img) => format!(
            "<figure><img src=\"{}\" alt=\"{}\" width=\"{}\" height=\"{}\"></figure>",
            img.data_uri(),
            esc(&img.name),
            img.width,
            img.height
        ),
    };
    format!("<section class=\"slide\" id=\"s{number}\"><h2>{t}</h2>{body}</section>\n")
}

fn bullet_list(bullets: &[Bullet]) -> String {
    let li: String = bullets
        .iter()
        .map(|b| format!("<li class=\"l{}\">{}</li>", b.level, esc(&b.text)))
        .collect();
    format!("<ul>{li}</ul>")
}

fn table_html(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut x = String::from("<table><thead><tr>");
    for h in headers {
        x.push_str(&format!("<th>{}</th>", esc(h)));
    }
    x.push_str("</tr></thead><tbody>");
    for row in rows {
        x.push_str("<tr>");
        for cell in row {
            x.push_str(&format!("<td>{}</td>", esc(cell)));
        }
        x.push_str("</tr>");
    }
    x.push_str("</tbody></table>");
    x
}

fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{ChartData, ChartShape, Series, SlideSpec};
    use crate::pipeline::images::{tests::solid_png, ImageAsset};
    use crate::render::render_deck;
    use crate::theme::find_theme;

    fn deck() -> Presentation {
        let image = ImageAsset::from_encoded(solid_png(120, 120), "fig.png", Some(2)).unwrap();
        render_deck(
            "Quarterly <Review>",
            vec![
                SlideSpec::new("Quarterly <Review>", SlidePayload::Title { subtitle: "Q3".into() }),
                SlideSpec::new(
                    "Points",
                    SlidePayload::Content {
                        bullets: Bullet::parse_all(&["Growth", "  - EU & US"]),
                    },
                ),
                SlideSpec::new(
                    "Numbers",
                    SlidePayload::Chart(ChartData {
                        shape: ChartShape::Line,
                        categories: vec!["Jan".into(), "Feb".into()],
                        series: vec![Series { name: "Users".into(), values: vec![10.0, 12.5] }],
                    }),
                ),
                SlideSpec::new("Figure 1 (page 2)", SlidePayload::Image(image)),
            ],
            find_theme("minimal").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn format_parsing() {
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert_eq!("html".parse::<ExportFormat>().unwrap(), ExportFormat::Html);
        assert!("docx".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Html.to_string(), "html");
    }

    #[test]
    fn html_is_self_contained() {
        let html = render_html(&deck());
        assert_eq!(html.matches("<section class=\"slide").count(), 4);
        assert!(html.contains("<title>Quarterly &lt;Review&gt;</title>"));
        assert!(html.contains("EU &amp; US"));
        assert!(html.contains("<td>12.5</td>"));
        assert!(html.contains("src=\"data:image/png;base64,"));
        assert!(!html.contains("http://"));
        assert!(!html.contains("https://"));
        assert!(!html.contains("<link"));
    }

    #[tokio::test]
    async fn html_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.html");
        let written = export_html(&deck(), &path).await.unwrap();
        assert_eq!(written, path);
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("<!DOCTYPE html>"));
    }

    #[tokio::test]
    async fn html_export_into_missing_dir_fails_softly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir/deck.html");
        let err = export_html(&deck(), &path).await.unwrap_err();
        assert!(matches!(err, ExportError::Failed { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn missing_converter_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let pptx = dir.path().join("deck.pptx");
        std::fs::write(&pptx, b"stub").unwrap();
        let err = export_pdf(&pptx, "doc2pptx-no-such-converter").await.unwrap_err();
        assert!(matches!(err, ExportError::Unavailable { .. }), "{err:?}");
        assert!(pptx.exists());
    }
}
