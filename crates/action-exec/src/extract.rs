//! Structured content extraction.
//!
//! The page script captures document structure (headings, links, lists,
//! tables, forms, metadata) plus a text sample and page-kind hints; the
//! executor then attaches detected price/time patterns. Extraction is
//! best-effort: a script fault degrades to a minimal payload instead of
//! failing the step.

use pagepilot_browser_port::tag_script;
use pagepilot_page_sense::patterns;
use serde_json::{json, Value};

const EXTRACT_BODY: &str = r#"(() => {
  const cap = (arr, n) => arr.slice(0, n);
  const textOf = (el) => (el.textContent || '').trim();
  const headings = cap(Array.from(document.querySelectorAll('h1, h2, h3')), 12)
    .map(h => ({ level: Number(h.tagName[1]), text: textOf(h).slice(0, 160) }))
    .filter(h => h.text);
  const links = cap(Array.from(document.querySelectorAll('a[href]')), 25)
    .map(a => ({ text: textOf(a).slice(0, 120), href: a.getAttribute('href') }))
    .filter(l => l.text);
  const lists = cap(Array.from(document.querySelectorAll('ul, ol')), 5)
    .map(list => cap(Array.from(list.querySelectorAll('li')), 10)
      .map(li => textOf(li).slice(0, 120)))
    .filter(items => items.length > 0);
  const tables = cap(Array.from(document.querySelectorAll('table')), 3).map(table => ({
    headers: cap(Array.from(table.querySelectorAll('th')), 12).map(textOf),
    rows: cap(Array.from(table.querySelectorAll('tr')), 10)
      .map(tr => cap(Array.from(tr.querySelectorAll('td')), 12)
        .map(td => textOf(td).slice(0, 80)))
      .filter(cells => cells.length > 0)
  }));
  const forms = cap(Array.from(document.querySelectorAll('form')), 4).map(form => ({
    fields: cap(Array.from(form.querySelectorAll('input, select, textarea')), 12).map(f => ({
      name: f.getAttribute('name'),
      type: f.getAttribute('type') || f.tagName.toLowerCase()
    }))
  }));
  const metaDescription = document.querySelector('meta[name="description"]');
  const bodyText = document.body ? (document.body.innerText || '') : '';
  const url = window.location.href;
  const title = document.title;
  const lowerUrl = url.toLowerCase();
  const pageKind = {
    searchResults: lowerUrl.includes('search') || lowerUrl.includes('?q=')
      || /results/i.test(title),
    product: /product|item|\/dp\//.test(lowerUrl),
    article: headings.length > 0 && bodyText.length > 1500 && links.length < 15
  };
  return {
    url, title, headings, links, lists, tables, forms,
    meta: { description: metaDescription ? metaDescription.getAttribute('content') : null },
    textSample: bodyText.slice(0, 2000),
    pageKind
  };
})()"#;

pub fn extract_script() -> String {
    tag_script("extract", &Value::Null, EXTRACT_BODY)
}

/// Attach detected price/time patterns to the script payload.
pub fn enrich(mut payload: Value) -> Value {
    let corpus = payload["textSample"].as_str().unwrap_or_default();
    let detected = patterns::detect(corpus);
    if let Some(object) = payload.as_object_mut() {
        object.insert("prices".to_string(), json!(detected.prices));
        object.insert("times".to_string(), json!(detected.times));
    }
    payload
}

/// Minimal payload used when the extraction script itself faults.
pub fn fallback_payload(url: &str, title: &str, reason: &str) -> Value {
    json!({
        "url": url,
        "title": title,
        "headings": [],
        "links": [],
        "textSample": "",
        "prices": [],
        "times": [],
        "note": format!("extraction unavailable: {}", reason),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrich_attaches_patterns() {
        let payload = json!({
            "url": "https://shop.test",
            "textSample": "Laptop $999.00, ships 4:30 PM. Mouse $999.00."
        });
        let enriched = enrich(payload);
        assert_eq!(enriched["prices"], json!(["$999.00"]));
        assert_eq!(enriched["times"], json!(["4:30 PM"]));
    }

    #[test]
    fn fallback_carries_reason() {
        let payload = fallback_payload("https://x.test", "X", "script fault");
        assert_eq!(payload["url"], "https://x.test");
        assert!(payload["note"].as_str().unwrap().contains("script fault"));
    }
}
