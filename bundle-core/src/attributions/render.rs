/*
 * This file is part of CycloneDX Rust Cargo.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 * SPDX-License-Identifier: Apache-2.0
 */

use super::{Attribution, AttributionsDocument};

pub(super) const SEPARATOR: &str = "\n----------------\n";

/// Deterministic canonical rendering: empty closure yields an empty string; otherwise a
/// fixed header followed by attribution blocks in strictly ascending `packageFqn` order.
pub(super) fn render(package_name: &str, attributions: &[Attribution], titles_omit_version: bool) -> AttributionsDocument {
    if attributions.is_empty() {
        return AttributionsDocument::default();
    }

    let mut sorted: Vec<&Attribution> = attributions.iter().collect();
    sorted.sort_by(|a, b| a.package_fqn.cmp(&b.package_fqn));

    let mut doc = format!("The {package_name} package includes the following third-party software/licensing:\n\n");
    let blocks: Vec<String> = sorted.iter().map(|a| render_block(a, titles_omit_version)).collect();
    doc.push_str(&blocks.join("\n"));
    AttributionsDocument(doc)
}

fn render_block(attribution: &Attribution, titles_omit_version: bool) -> String {
    let title = if titles_omit_version {
        attribution.name.clone()
    } else {
        attribution.package_fqn.clone()
    };
    let first_license = attribution.licenses.first().map(String::as_str).unwrap_or("");

    let mut block = format!("** {title} - {} | {first_license}", attribution.url);
    if let Some(body) = attribution.notice_text.as_deref().or(attribution.license_text.as_deref()) {
        block.push('\n');
        block.push_str(&normalize_line_endings(body));
    }
    block.push_str(SEPARATOR);
    block
}

pub(super) fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribution(name: &str, version: &str, url: &str, licenses: Vec<&str>, notice: Option<&str>, license_text: Option<&str>) -> Attribution {
        Attribution {
            package_fqn: format!("{name}@{version}"),
            name: name.to_string(),
            version: version.to_string(),
            url: url.to_string(),
            licenses: licenses.into_iter().map(str::to_string).collect(),
            license_text: license_text.map(str::to_string),
            notice_text: notice.map(str::to_string),
        }
    }

    #[test]
    fn notice_text_wins_over_license_text() {
        let a = attribution(
            "dep1",
            "1.0.0",
            "https://example.com/dep1",
            vec!["MIT"],
            Some("notice body"),
            Some("license body"),
        );
        let doc = render("consumer", &[a], false);
        assert!(doc.as_str().contains("notice body"));
        assert!(!doc.as_str().contains("license body"));
    }

    #[test]
    fn crlf_is_normalized_to_lf() {
        let a = attribution("dep1", "1.0.0", "https://example.com/dep1", vec!["MIT"], None, Some("line1\r\nline2"));
        let doc = render("consumer", &[a], false);
        assert!(!doc.as_str().contains('\r'));
        assert!(doc.as_str().contains("line1\nline2"));
    }

    #[test]
    fn titles_omit_version_when_versions_are_externalized() {
        let a = attribution("dep1", "1.0.0", "https://example.com/dep1", vec!["MIT"], None, None);
        let doc = render("consumer", &[a], true);
        assert!(doc.as_str().contains("** dep1 - "));
        assert!(!doc.as_str().contains("** dep1@1.0.0"));
    }
}
