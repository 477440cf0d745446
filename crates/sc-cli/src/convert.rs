use std::fs;
use std::path::Path;
use std::time::Instant;

use log::info;
use serde::Serialize;

use sc_compiler::{CompilerOptions, ContentBlockerConverter, ConversionResult, SafariVersion};
use sc_core::parse_rules;

#[derive(Debug, Clone, Serialize)]
pub struct RuleProblem {
    pub file: String,
    pub line: usize,
    pub rule: String,
    pub error: String,
}

/// Read every input file. Returns one entry per file with its lines.
pub fn read_lists(inputs: &[String]) -> Result<Vec<(String, String)>, String> {
    if inputs.is_empty() {
        return Err("No input files specified".to_string());
    }

    inputs
        .iter()
        .map(|path| {
            fs::read_to_string(path)
                .map(|content| (path.clone(), content))
                .map_err(|e| format!("Failed to read '{}': {}", path, e))
        })
        .collect()
}

pub fn convert_lists(
    lists: &[(String, String)],
    version: SafariVersion,
    options: CompilerOptions,
    limit: Option<usize>,
) -> Result<ConversionResult, String> {
    let start = Instant::now();

    let mut converter = ContentBlockerConverter::new(version, options);
    if let Some(limit) = limit {
        converter = converter.with_limit(limit);
    }

    for (path, content) in lists {
        info!(
            "{} - {} lines",
            Path::new(path).file_name().unwrap_or_default().to_string_lossy(),
            content.lines().count()
        );
    }

    let result = converter
        .convert_array(lists.iter().flat_map(|(_, content)| content.lines()))
        .map_err(|e| format!("Conversion failed: {}", e))?;

    info!("Converted in {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    Ok(result)
}

pub fn write_result(path: &str, result: &ConversionResult) -> Result<(), String> {
    let json = serde_json::to_string_pretty(result).map_err(|e| format!("Failed to serialize result: {}", e))?;
    fs::write(path, json).map_err(|e| format!("Failed to write '{}': {}", path, e))
}

pub fn check_lists(lists: &[(String, String)]) -> Vec<RuleProblem> {
    let mut problems = Vec::new();
    for (path, content) in lists {
        let parsed = parse_rules(content.lines());
        problems.extend(parsed.errors.into_iter().map(|(line, rule, error)| RuleProblem {
            file: path.clone(),
            line,
            rule,
            error: error.to_string(),
        }));
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(path: &str, content: &str) -> (String, String) {
        (path.to_string(), content.to_string())
    }

    #[test]
    fn read_lists_requires_inputs() {
        assert!(read_lists(&[]).is_err());
        let err = read_lists(&["/nonexistent/filters.txt".to_string()]).unwrap_err();
        assert!(err.contains("Failed to read"));
    }

    #[test]
    fn converts_and_writes_json() {
        let lists = vec![list("a.txt", "##.ad\n||ads.com^"), list("b.txt", "example.org#@#.ad")];
        let result = convert_lists(&lists, SafariVersion::Safari15, CompilerOptions::default(), None).unwrap();
        assert_eq!(result.converted_count, 2);
        assert!(result.converted.contains("\"unless-domain\":[\"*example.org\"]"));

        let path = std::env::temp_dir().join(format!("sc-cli-test-{}.json", std::process::id()));
        let path = path.to_string_lossy().to_string();
        write_result(&path, &result).unwrap();
        let written: ConversionResult = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(written, result);
    }

    #[test]
    fn limit_truncates() {
        let lists = vec![list("a.txt", "||a.com^\n||b.com^\n||c.com^")];
        let result = convert_lists(&lists, SafariVersion::Safari15, CompilerOptions::default(), Some(2)).unwrap();
        assert!(result.over_limit);
        assert_eq!(result.converted_count, 2);
    }

    #[test]
    fn check_reports_file_and_line() {
        let lists = vec![list("a.txt", "##.ad"), list("b.txt", "! header\n||ads.com^$bogus")];
        let problems = check_lists(&lists);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].file, "b.txt");
        assert_eq!(problems[0].line, 2);
        assert_eq!(problems[0].rule, "||ads.com^$bogus");
    }
}
