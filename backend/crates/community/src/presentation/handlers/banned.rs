//! Banned Surface

use axum::response::Html;

const BANNED_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Account banned</title>
</head>
<body>
<main>
<h1>Your account has been banned</h1>
<p>You can no longer post, follow or comment. Contact an administrator if you think this is a mistake.</p>
<form method="post" action="/api/auth/logout"><button type="submit">Sign out</button></form>
</main>
</body>
</html>
"#;

/// GET /banned
pub async fn page() -> Html<&'static str> {
    Html(BANNED_PAGE)
}
