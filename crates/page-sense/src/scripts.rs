//! In-page collection script.
//!
//! One IIFE gathers everything the sensor needs in a single round trip:
//! candidate interactive elements (deduplicated, visibility-filtered, each
//! with a locator), the visible text and an HTML excerpt. Text budgets are
//! substituted into the script so oversized pages are cut before transfer.

use pagepilot_browser_port::tag_script;
use serde_json::json;

use crate::sensor::SenseBudget;

const COLLECT_BODY: &str = r##"(() => {
  const SELECTORS = [
    'a', 'button', 'input', 'select', 'textarea',
    '[role="button"]', '[role="link"]', '[role="checkbox"]', '[role="radio"]',
    '[role="textbox"]', '[role="combobox"]', '[role="searchbox"]',
    '[role="menuitem"]', '[role="tab"]', '[role="option"]',
    '[onclick]', '[tabindex]',
    '[class*="dropdown"]', '[class*="calendar"]', '[class*="datepicker"]'
  ];
  const seen = new Set();
  const picked = [];
  for (const sel of SELECTORS) {
    let found;
    try { found = document.querySelectorAll(sel); } catch (e) { continue; }
    for (const el of found) {
      if (seen.has(el)) continue;
      seen.add(el);
      picked.push(el);
    }
  }
  const isVisible = (el) => {
    if (el.getAttribute('aria-hidden') === 'false') return true;
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') {
      return false;
    }
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
  };
  const locatorFor = (el) => {
    if (el.id) return '#' + CSS.escape(el.id);
    const parts = [];
    let node = el;
    let depth = 0;
    while (node && node.nodeType === 1 && depth < 5) {
      if (node.id) { parts.unshift('#' + CSS.escape(node.id)); break; }
      let part = node.tagName.toLowerCase();
      const cls = (typeof node.className === 'string') ? node.className.trim().split(/\s+/)[0] : '';
      if (cls) part += '.' + CSS.escape(cls);
      let index = 1;
      let sib = node;
      while ((sib = sib.previousElementSibling)) {
        if (sib.tagName === node.tagName) index += 1;
      }
      part += ':nth-of-type(' + index + ')';
      parts.unshift(part);
      node = node.parentElement;
      depth += 1;
    }
    return parts.join(' > ');
  };
  const describe = (el) => {
    const rect = el.getBoundingClientRect();
    const tag = el.tagName.toLowerCase();
    const type = el.getAttribute('type');
    const name = el.getAttribute('name');
    const placeholder = el.getAttribute('placeholder');
    const role = el.getAttribute('role');
    const className = (typeof el.className === 'string') ? el.className : '';
    const lowerPlaceholder = (placeholder || '').toLowerCase();
    return {
      tag,
      selector: locatorFor(el),
      text: (el.textContent || '').trim().slice(0, 120),
      type,
      placeholder,
      value: ('value' in el) ? String(el.value).slice(0, 120) : null,
      href: el.getAttribute('href'),
      id: el.id || null,
      className: className || null,
      name,
      ariaLabel: el.getAttribute('aria-label'),
      role,
      dataTestId: el.getAttribute('data-test-id') || el.getAttribute('data-testid'),
      checked: (tag === 'input' && (type === 'checkbox' || type === 'radio')) ? el.checked : null,
      selected: (tag === 'option') ? el.selected : null,
      disabled: el.disabled === true,
      readonly: el.readOnly === true,
      options: (tag === 'select')
        ? Array.from(el.options || []).slice(0, 30).map(o => (o.textContent || '').trim())
        : [],
      visible: true,
      clickable: tag === 'a' || tag === 'button' || tag === 'select'
        || ['button', 'submit', 'checkbox', 'radio'].includes(type || '')
        || ['button', 'link', 'checkbox', 'menuitem', 'tab', 'option'].includes(role || '')
        || el.onclick != null,
      position: { x: rect.x, y: rect.y, width: rect.width, height: rect.height },
      inViewport: rect.top < window.innerHeight && rect.bottom > 0,
      isDateInput: type === 'date' || /date|calendar/.test(className),
      isSearchInput: type === 'search' || ['q', 'query', 'search'].includes(name || '')
        || lowerPlaceholder.includes('search') || role === 'searchbox',
      hasDropdown: tag === 'select' || /dropdown/.test(className)
    };
  };
  const elements = picked.filter(isVisible).map(describe);
  const body = document.body;
  return {
    url: window.location.href,
    title: document.title,
    elements,
    visibleText: body ? (body.innerText || '').slice(0, __MAX_TEXT__) : '',
    rawHtml: body ? body.innerHTML.slice(0, __MAX_HTML__) : ''
  };
})()"##;

/// Build the tagged collection script for the given budget.
pub fn collect_page_state(budget: &SenseBudget) -> String {
    let body = COLLECT_BODY
        .replace("__MAX_TEXT__", &budget.max_text_chars.to_string())
        .replace("__MAX_HTML__", &budget.max_html_chars.to_string());
    tag_script(
        "collect_state",
        &json!({
            "maxText": budget.max_text_chars,
            "maxHtml": budget.max_html_chars,
        }),
        &body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budgets_are_substituted() {
        let script = collect_page_state(&SenseBudget::default());
        assert!(script.contains(".slice(0, 5000)"));
        assert!(script.contains(".slice(0, 15000)"));
        assert!(!script.contains("__MAX_TEXT__"));
    }

    #[test]
    fn script_is_tagged() {
        let script = collect_page_state(&SenseBudget::default());
        let tag = pagepilot_browser_port::parse_tag(&script).unwrap();
        assert_eq!(tag.name, "collect_state");
    }
}
