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

use std::collections::BTreeMap;
use std::path::Path;

use crate::violation::{Violation, ViolationKind};

/// Verifies declared resource paths exist under the package root.
pub struct ResourceResolver;

impl ResourceResolver {
    /// Each relative path in `resources` is resolved against `package_root` and checked for
    /// existence. A missing path yields a `missing-resource` violation naming the logical
    /// name; never auto-fixable.
    pub fn resolve(package_root: &Path, resources: &BTreeMap<String, String>) -> Vec<Violation> {
        resources
            .iter()
            .filter_map(|(logical_name, relative_path)| {
                let full_path = package_root.join(relative_path);
                if full_path.exists() {
                    None
                } else {
                    Some(Violation::new(
                        ViolationKind::MissingResource,
                        format!(
                            "Unable to find resource ({logical_name}) relative to the package directory"
                        ),
                    ))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_resource_is_reported() {
        let tmp = TempDir::new().unwrap();
        let mut resources = BTreeMap::new();
        resources.insert("missing".to_string(), "bin/missing".to_string());

        let violations = ResourceResolver::resolve(tmp.path(), &resources);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "Unable to find resource (missing) relative to the package directory"
        );
        assert!(!violations[0].fixable());
    }

    #[test]
    fn present_resource_is_not_reported() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("bin")).unwrap();
        std::fs::write(tmp.path().join("bin/present"), b"").unwrap();
        let mut resources = BTreeMap::new();
        resources.insert("present".to_string(), "bin/present".to_string());

        let violations = ResourceResolver::resolve(tmp.path(), &resources);
        assert!(violations.is_empty());
    }
}
