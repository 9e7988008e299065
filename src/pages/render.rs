//! HTML rendering for bucket pages.

use crate::config::ExperimentConfig;

/// Shown in place of the bucket name for the fallback bucket.
pub const NOT_SET_UP_MESSAGE: &str = "Experiment not set up, please read README to set up example.";

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

/// Text describing the bucket, with the fallback bucket spelled out.
pub fn bucket_label<'a>(bucket: &'a str, experiment: &ExperimentConfig) -> &'a str {
    if bucket == experiment.fallback_bucket {
        NOT_SET_UP_MESSAGE
    } else {
        bucket
    }
}

/// Full page for `bucket`.
pub fn render_bucket_page(bucket: &str, flag_on: bool, experiment: &ExperimentConfig) -> String {
    let label = escape_html(bucket_label(bucket, experiment));
    let gate = escape_html(&experiment.gate);
    let experiment_name = escape_html(&experiment.name);
    let param = escape_html(&experiment.param);
    let flag = if flag_on { "on" } else { "off" };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Edge experimentation</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 48rem; margin: 3rem auto; padding: 0 1rem; line-height: 1.6; }}
pre {{ background: #000; color: #fff; padding: .5rem 1rem; border-radius: .5rem; }}
button {{ font-size: 1rem; padding: .5rem 1.25rem; }}
</style>
</head>
<body>
<h1>Performant experimentation at the edge</h1>
<p>Every visit to <code>/</code> is assigned a bucket before any page logic runs.
The assignment is keyed on a visitor id kept in a cookie for 24 hours, so as long
as you keep that cookie you will always land in the same bucket.</p>
<p>One page per bucket is rendered ahead of time, which keeps the rewrite to
<code>/[bucket]</code> cheap.</p>
<pre>bucket: {label}</pre>
<pre>feature flag `{gate}`: {flag}</pre>
<form method="post" action="/reset">
<button type="submit">Reset bucket and revisit site</button>
</form>
<p>To set this up yourself, create an experiment called <code>{experiment_name}</code>
with one group per bucket, each carrying a <code>{param}</code> parameter, and start it.
Visitors will then see the bucket they were assigned to.</p>
</body>
</html>
"#
    )
}
