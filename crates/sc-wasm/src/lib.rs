//! WebAssembly bindings for SafariConverter

use wasm_bindgen::prelude::*;

use sc_compiler::{CompilerOptions, ContentBlockerConverter, ConversionResult, SafariVersion};
use sc_core::parse_rules;

/// Convert filter lists to Safari content blocker JSON.
///
/// `list_texts` is an array of filter list texts. Returns an object with the fields of
/// `ConversionResult` in camelCase.
#[wasm_bindgen]
pub fn convert_filter_lists(
    list_texts: JsValue,
    safari_version: f64,
    advanced_blocking: bool,
    optimize: bool,
) -> Result<JsValue, JsValue> {
    let list_array = js_sys::Array::from(&list_texts);
    if list_array.length() == 0 {
        return Err(JsValue::from_str("No list texts provided"));
    }

    let mut texts = Vec::with_capacity(list_array.length() as usize);
    for value in list_array.iter() {
        let text = value
            .as_string()
            .ok_or_else(|| JsValue::from_str("List text must be a string"))?;
        texts.push(text);
    }

    let options = CompilerOptions {
        optimize,
        advanced_blocking,
    };
    let result = convert_texts(&texts, safari_version, options).map_err(|e| JsValue::from_str(&e))?;

    if result.over_limit {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "Content blocker over limit: {} of {} entries kept",
            result.converted_count, result.total_converted_count
        )));
    }

    let js_result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&js_result, &"converted".into(), &JsValue::from_str(&result.converted));
    let _ = js_sys::Reflect::set(&js_result, &"convertedCount".into(), &JsValue::from(result.converted_count as u32));
    let _ = js_sys::Reflect::set(&js_result, &"totalConvertedCount".into(), &JsValue::from(result.total_converted_count as u32));
    let _ = js_sys::Reflect::set(&js_result, &"errorsCount".into(), &JsValue::from(result.errors_count as u32));
    let _ = js_sys::Reflect::set(&js_result, &"overLimit".into(), &JsValue::from(result.over_limit));
    let _ = js_sys::Reflect::set(
        &js_result,
        &"advancedBlockingConvertedCount".into(),
        &JsValue::from(result.advanced_blocking_converted_count as u32),
    );
    if let Some(advanced) = &result.advanced_blocking {
        let _ = js_sys::Reflect::set(&js_result, &"advancedBlocking".into(), &JsValue::from_str(advanced));
    }

    Ok(js_result.into())
}

/// Parse a filter list and return the rules that fail, as `{ line, rule, error }` objects.
#[wasm_bindgen]
pub fn check_filter_list(list_text: &str) -> JsValue {
    let errors = list_errors(list_text);
    let js_errors = js_sys::Array::new_with_length(errors.len() as u32);
    for (i, (line, rule, error)) in errors.into_iter().enumerate() {
        let item = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&item, &"line".into(), &JsValue::from(line as u32));
        let _ = js_sys::Reflect::set(&item, &"rule".into(), &JsValue::from_str(&rule));
        let _ = js_sys::Reflect::set(&item, &"error".into(), &JsValue::from_str(&error));
        js_errors.set(i as u32, item.into());
    }
    js_errors.into()
}

fn convert_texts(texts: &[String], safari_version: f64, options: CompilerOptions) -> Result<ConversionResult, String> {
    let version = SafariVersion::from_f64(safari_version).map_err(|e| e.to_string())?;
    let converter = ContentBlockerConverter::new(version, options);
    converter
        .convert_array(texts.iter().flat_map(|text| text.lines()))
        .map_err(|e| e.to_string())
}

fn list_errors(list_text: &str) -> Vec<(usize, String, String)> {
    parse_rules(list_text.lines())
        .errors
        .into_iter()
        .map(|(line, rule, error)| (line, rule, error.to_string()))
        .collect()
}
