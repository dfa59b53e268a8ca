//! Per-action page scripts.
//!
//! Every script is one IIFE returning a small JSON object; element-targeted
//! scripts re-resolve the selector first and report `{ok:false,
//! reason:'not-found'}` when it no longer matches. Values are embedded as
//! JSON literals, so selectors and text need no extra escaping.

use pagepilot_browser_port::tag_script;
use serde_json::{json, Value};

use crate::model::{ScrollDirection, Selector};

fn js_str(raw: &str) -> String {
    // serde_json string encoding doubles as JS string literal encoding.
    Value::String(raw.to_string()).to_string()
}

fn with_element(name: &str, selector: &Selector, args: Value, inner: &str) -> String {
    let body = format!(
        "(() => {{\n  const el = document.querySelector({sel});\n  if (!el) return {{ ok: false, reason: 'not-found' }};\n{inner}\n}})()",
        sel = js_str(selector.as_str()),
        inner = inner,
    );
    tag_script(name, &args, &body)
}

pub fn click(selector: &Selector) -> String {
    with_element(
        "click",
        selector,
        json!({"selector": selector.as_str()}),
        r#"  el.scrollIntoView({ block: 'center' });
  const rect = el.getBoundingClientRect();
  const opts = {
    bubbles: true, cancelable: true, view: window,
    clientX: rect.x + rect.width / 2, clientY: rect.y + rect.height / 2
  };
  for (const type of ['pointerdown', 'mousedown', 'pointerup', 'mouseup', 'click']) {
    el.dispatchEvent(new MouseEvent(type, opts));
  }
  return { ok: true };"#,
    )
}

pub fn double_click(selector: &Selector) -> String {
    with_element(
        "double_click",
        selector,
        json!({"selector": selector.as_str()}),
        r#"  el.scrollIntoView({ block: 'center' });
  const opts = { bubbles: true, cancelable: true, view: window, detail: 2 };
  for (const type of ['pointerdown', 'mousedown', 'pointerup', 'mouseup', 'click',
                      'pointerdown', 'mousedown', 'pointerup', 'mouseup', 'click', 'dblclick']) {
    el.dispatchEvent(new MouseEvent(type, opts));
  }
  return { ok: true };"#,
    )
}

pub fn right_click(selector: &Selector) -> String {
    with_element(
        "right_click",
        selector,
        json!({"selector": selector.as_str()}),
        r#"  el.scrollIntoView({ block: 'center' });
  const opts = { bubbles: true, cancelable: true, view: window, button: 2 };
  for (const type of ['pointerdown', 'mousedown', 'pointerup', 'mouseup', 'contextmenu']) {
    el.dispatchEvent(new MouseEvent(type, opts));
  }
  return { ok: true };"#,
    )
}

pub fn hover(selector: &Selector) -> String {
    with_element(
        "hover",
        selector,
        json!({"selector": selector.as_str()}),
        r#"  const opts = { bubbles: true, cancelable: true, view: window };
  for (const type of ['pointerover', 'mouseover', 'mouseenter', 'mousemove']) {
    el.dispatchEvent(new MouseEvent(type, opts));
  }
  return { ok: true };"#,
    )
}

pub fn focus(selector: &Selector) -> String {
    with_element(
        "focus",
        selector,
        json!({"selector": selector.as_str()}),
        "  el.focus();\n  return { ok: true };",
    )
}

pub fn blur(selector: &Selector) -> String {
    with_element(
        "blur",
        selector,
        json!({"selector": selector.as_str()}),
        "  el.blur();\n  return { ok: true };",
    )
}

pub fn clear(selector: &Selector) -> String {
    with_element(
        "clear",
        selector,
        json!({"selector": selector.as_str()}),
        r#"  const proto = el instanceof HTMLTextAreaElement
    ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
  const desc = Object.getOwnPropertyDescriptor(proto, 'value');
  if (desc && desc.set) { desc.set.call(el, ''); } else { el.value = ''; }
  el.dispatchEvent(new Event('input', { bubbles: true }));
  el.dispatchEvent(new Event('change', { bubbles: true }));
  return { ok: true };"#,
    )
}

/// Set the field's value through the native setter and report whether the
/// target looks like a search box (those get auto-submitted by the executor).
pub fn type_text(selector: &Selector, text: &str) -> String {
    let inner = format!(
        r#"  el.focus();
  const value = {text};
  const proto = el instanceof HTMLTextAreaElement
    ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
  const desc = Object.getOwnPropertyDescriptor(proto, 'value');
  if (desc && desc.set) {{ desc.set.call(el, value); }} else {{ el.value = value; }}
  el.dispatchEvent(new Event('input', {{ bubbles: true }}));
  el.dispatchEvent(new Event('change', {{ bubbles: true }}));
  const name = el.getAttribute('name') || '';
  const placeholder = (el.getAttribute('placeholder') || '').toLowerCase();
  const searchBox = el.getAttribute('type') === 'search'
    || ['q', 'query', 'search'].includes(name)
    || placeholder.includes('search')
    || el.getAttribute('role') === 'searchbox';
  return {{ ok: true, searchBox }};"#,
        text = js_str(text),
    );
    with_element(
        "type",
        selector,
        json!({"selector": selector.as_str(), "text": text}),
        &inner,
    )
}

pub fn submit_search(selector: &Selector) -> String {
    with_element(
        "submit_search",
        selector,
        json!({"selector": selector.as_str()}),
        r#"  const opts = { key: 'Enter', code: 'Enter', keyCode: 13, which: 13,
    bubbles: true, cancelable: true };
  el.dispatchEvent(new KeyboardEvent('keydown', opts));
  el.dispatchEvent(new KeyboardEvent('keypress', opts));
  el.dispatchEvent(new KeyboardEvent('keyup', opts));
  if (el.form) {
    if (typeof el.form.requestSubmit === 'function') el.form.requestSubmit();
    else el.form.submit();
  }
  return { ok: true };"#,
    )
}

/// Native selects match by visible text first, then by value; non-native
/// widgets are opened with a click and the option picked by text.
pub fn select_option(selector: &Selector, option: &str) -> String {
    let inner = format!(
        r#"  const wanted = {option};
  if (el.tagName === 'SELECT') {{
    const options = Array.from(el.options || []);
    let index = options.findIndex(o => (o.textContent || '').trim() === wanted);
    let matched = 'text';
    if (index < 0) {{ index = options.findIndex(o => o.value === wanted); matched = 'value'; }}
    if (index < 0) return {{ ok: false, reason: 'option-not-found' }};
    el.selectedIndex = index;
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return {{ ok: true, matched }};
  }}
  el.click();
  const pool = document.querySelectorAll(
    '[role="option"], [role="menuitem"], li, .dropdown-item, .select-option');
  for (const item of pool) {{
    if ((item.textContent || '').trim() === wanted) {{
      item.click();
      return {{ ok: true, matched: 'custom' }};
    }}
  }}
  return {{ ok: false, reason: 'option-not-found' }};"#,
        option = js_str(option),
    );
    with_element(
        "select_option",
        selector,
        json!({"selector": selector.as_str(), "option": option}),
        &inner,
    )
}

/// Click only when the current checked state differs from `desired`.
pub fn set_checked(selector: &Selector, desired: bool) -> String {
    let inner = format!(
        r#"  const desired = {desired};
  const type = (el.getAttribute('type') || '').toLowerCase();
  if (el.tagName !== 'INPUT' || (type !== 'checkbox' && type !== 'radio')) {{
    return {{ ok: false, reason: 'not-checkbox' }};
  }}
  const changed = el.checked !== desired;
  if (changed) el.click();
  if (el.checked !== desired) el.checked = desired;
  return {{ ok: true, changed }};"#,
        desired = desired,
    );
    with_element(
        "set_checked",
        selector,
        json!({"selector": selector.as_str(), "desired": desired}),
        &inner,
    )
}

pub fn keypress(selector: Option<&Selector>, key: &str) -> String {
    let sel_literal = match selector {
        Some(selector) => js_str(selector.as_str()),
        None => "null".to_string(),
    };
    let body = format!(
        r#"(() => {{
  const key = {key};
  const sel = {sel};
  const el = sel ? document.querySelector(sel) : (document.activeElement || document.body);
  if (!el) return {{ ok: false, reason: 'not-found' }};
  const opts = {{ key, code: key, bubbles: true, cancelable: true }};
  el.dispatchEvent(new KeyboardEvent('keydown', opts));
  el.dispatchEvent(new KeyboardEvent('keypress', opts));
  el.dispatchEvent(new KeyboardEvent('keyup', opts));
  return {{ ok: true }};
}})()"#,
        key = js_str(key),
        sel = sel_literal,
    );
    let args = json!({
        "selector": selector.map(|s| s.as_str().to_string()),
        "key": key,
    });
    tag_script("keypress", &args, &body)
}

pub fn scroll_to_element(selector: &Selector) -> String {
    with_element(
        "scroll",
        selector,
        json!({"selector": selector.as_str()}),
        "  el.scrollIntoView({ block: 'center' });\n  return { ok: true };",
    )
}

pub fn scroll_viewport(direction: ScrollDirection, amount_px: u32) -> String {
    let body = format!(
        r#"(() => {{
  const amount = {amount};
  const dir = '{dir}';
  const dx = dir === 'left' ? -amount : dir === 'right' ? amount : 0;
  const dy = dir === 'up' ? -amount : dir === 'down' ? amount : 0;
  window.scrollBy({{ left: dx, top: dy }});
  return {{ ok: true }};
}})()"#,
        amount = amount_px,
        dir = direction.as_str(),
    );
    tag_script(
        "scroll",
        &json!({"direction": direction.as_str(), "amount": amount_px}),
        &body,
    )
}

pub fn element_visible(selector: &Selector) -> String {
    let body = format!(
        r#"(() => {{
  const el = document.querySelector({sel});
  if (!el) return {{ visible: false }};
  const style = window.getComputedStyle(el);
  if (style.display === 'none' || style.visibility === 'hidden') return {{ visible: false }};
  const rect = el.getBoundingClientRect();
  return {{ visible: rect.width > 0 && rect.height > 0 }};
}})()"#,
        sel = js_str(selector.as_str()),
    );
    tag_script(
        "element_visible",
        &json!({"selector": selector.as_str()}),
        &body,
    )
}

pub fn content_ready(min_text_chars: usize) -> String {
    let body = format!(
        r#"(() => {{
  if (document.readyState !== 'complete') return {{ ready: false }};
  if (document.querySelector('[aria-busy="true"]')) return {{ ready: false }};
  const spinner = document.querySelector('.spinner, .loading, .loader, [class*="skeleton"]');
  if (spinner) {{
    const rect = spinner.getBoundingClientRect();
    if (rect.width > 0 && rect.height > 0) return {{ ready: false }};
  }}
  const text = document.body ? (document.body.innerText || '') : '';
  return {{ ready: text.length > {min} }};
}})()"#,
        min = min_text_chars,
    );
    tag_script("content_ready", &json!({"minChars": min_text_chars}), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepilot_browser_port::parse_tag;

    #[test]
    fn selectors_embed_as_json_literals() {
        let selector = Selector::new("a[title=\"it's here\"]");
        let script = click(&selector);
        assert!(script.contains(r#"document.querySelector("a[title=\"it's here\"]")"#));
        let tag = parse_tag(&script).unwrap();
        assert_eq!(tag.name, "click");
        assert_eq!(tag.args["selector"], "a[title=\"it's here\"]");
    }

    #[test]
    fn page_level_keypress_targets_active_element() {
        let script = keypress(None, "Escape");
        assert!(script.contains("document.activeElement || document.body"));
        let tag = parse_tag(&script).unwrap();
        assert!(tag.args["selector"].is_null());
        assert_eq!(tag.args["key"], "Escape");
    }

    #[test]
    fn scroll_scripts_share_one_tag() {
        let by_element = scroll_to_element(&Selector::new("#results"));
        let by_viewport = scroll_viewport(ScrollDirection::Up, 600);
        assert_eq!(parse_tag(&by_element).unwrap().name, "scroll");
        let tag = parse_tag(&by_viewport).unwrap();
        assert_eq!(tag.name, "scroll");
        assert_eq!(tag.args["direction"], "up");
    }
}
