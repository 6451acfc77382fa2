// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::response::Html;

const USAGE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>tagq</title></head>
<body>
<h1>tagq job orchestration daemon</h1>
<p>POST a file to <a href="/input">/input</a> to queue it for tagging.</p>
<ul>
  <li>GET /health</li>
  <li>GET /status, GET /status/&lt;id&gt;</li>
  <li>GET /output, GET /output/&lt;id&gt;</li>
  <li>GET /error, GET /error/&lt;id&gt;</li>
</ul>
</body>
</html>
"#;

pub async fn index() -> Html<&'static str> {
    Html(USAGE_PAGE)
}
