use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::{ResultRow, Station};

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="ko">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>군산 적설 데이터 조회</title>
<style>
body { font-family: sans-serif; padding: 20px; background: #f4f4f9; color: #333; }
.container { max-width: 900px; margin: auto; }
table { width: 100%; border-collapse: collapse; margin-top: 25px; background: white; }
th, td { border: 1px solid #e0e0e0; padding: 12px; text-align: center; }
th { background: #007bff; color: white; }
.no-data, .error { text-align: center; color: #dc3545; margin-top: 30px; font-weight: bold; }
</style>
</head>
<body>
<div class="container">
<h1>군산 지역 적설 데이터 조회</h1>
"#;

const TABLE_HEAD: &str = "<table>\n<thead><tr><th>시간</th><th>지역</th><th>총 쌓인 눈 (cm)</th><th>새로 내린 눈 (cm)</th></tr></thead>\n<tbody>\n";

pub const NO_DATA_MESSAGE: &str = "데이터를 불러오지 못했거나, 해당 날짜의 데이터가 없습니다.";

/// Everything the snow page needs to render
pub struct PageView<'a> {
    /// Date as typed by the user, echoed back into the form
    pub date: &'a str,
    pub stations: &'a [Station],
    /// Selected station code, or `None` for all stations
    pub selected: Option<&'a str>,
    pub rows: Option<&'a [ResultRow]>,
    pub error: Option<&'a str>,
}

pub fn render_page(view: &PageView<'_>) -> String {
    let mut html = String::from(PAGE_HEAD);

    html.push_str(&format!(
        "<form method=\"get\">\n<label>조회 날짜 (YYYYMMDD): <input type=\"text\" name=\"date\" placeholder=\"YYYYMMDD\" value=\"{}\"></label>\n<select name=\"station\">\n<option value=\"all\"{}>전체 지점</option>\n",
        encode_double_quoted_attribute(view.date),
        selected_attr(view.selected.is_none()),
    ));
    for station in view.stations {
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            encode_double_quoted_attribute(&station.code),
            selected_attr(view.selected == Some(station.code.as_str())),
            encode_text(&station.name),
        ));
    }
    html.push_str("</select>\n<button type=\"submit\">조회하기</button>\n</form>\n");

    match (view.error, view.rows) {
        (Some(error), _) => {
            html.push_str(&format!("<div class=\"error\">{}</div>\n", encode_text(error)));
        }
        (None, Some(rows)) => {
            html.push_str(TABLE_HEAD);
            for row in rows {
                html.push_str(&format!(
                    "<tr><td>{}:00</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                    encode_text(&row.hour),
                    encode_text(&row.name),
                    encode_text(row.tot.as_str()),
                    encode_text(row.day.as_str()),
                ));
            }
            html.push_str("</tbody>\n</table>\n");
        }
        (None, None) => {
            html.push_str(&format!("<div class=\"no-data\">{NO_DATA_MESSAGE}</div>\n"));
        }
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn selected_attr(selected: bool) -> &'static str {
    if selected {
        " selected"
    } else {
        ""
    }
}
