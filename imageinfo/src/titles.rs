// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::Serialize;

use crate::config::{BuildEnv, TitleVars};

/// Human-readable device name as shown by update clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Title {
    /// Structured name; only the parts that were given are emitted
    Device {
        #[serde(skip_serializing_if = "Option::is_none")]
        vendor: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        variant: Option<String>,
    },
    /// Free-form `DEVICE_TITLE`, used when no structured name exists.
    /// Serializes as `null` if that variable is unset too.
    Fallback { title: Option<String> },
}

impl From<&TitleVars> for Title {
    fn from(t: &TitleVars) -> Self {
        Title::Device {
            vendor: t.vendor.clone(),
            model: t.model.clone(),
            variant: t.variant.clone(),
        }
    }
}

/// Collects the primary and `ALT0_`..`ALT5_` titles, in that order
pub fn assemble_titles(env: &BuildEnv) -> Vec<Title> {
    let mut titles: Vec<Title> = env
        .titles
        .iter()
        .filter(|t| !t.is_empty())
        .map(Title::from)
        .collect();

    if titles.is_empty() {
        titles.push(Title::Fallback {
            title: env.device_title.clone(),
        });
    }
    titles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(titles: &[Title]) -> String {
        serde_json::to_string(titles).unwrap()
    }

    #[test]
    fn follows_prefix_order() {
        let mut env = BuildEnv::default();
        env.titles[0].model = Some("WNDR3700".to_owned());
        env.titles[2].vendor = Some("Netgear".to_owned());

        let titles = assemble_titles(&env);
        assert_eq!(
            json(&titles),
            r#"[{"model":"WNDR3700"},{"vendor":"Netgear"}]"#
        );
    }

    #[test]
    fn field_order_is_fixed() {
        let mut env = BuildEnv::default();
        env.titles[4] = TitleVars {
            vendor: Some("TP-Link".to_owned()),
            model: Some("Archer C7".to_owned()),
            variant: Some("v2".to_owned()),
        };
        env.device_title = Some("ignored".to_owned());

        assert_eq!(
            json(&assemble_titles(&env)),
            r#"[{"vendor":"TP-Link","model":"Archer C7","variant":"v2"}]"#
        );
    }

    #[test]
    fn falls_back_to_device_title() {
        let mut env = BuildEnv::default();
        env.device_title = Some("Generic x86/64".to_owned());
        assert_eq!(
            json(&assemble_titles(&env)),
            r#"[{"title":"Generic x86/64"}]"#
        );
    }

    #[test]
    fn fallback_without_device_title_is_null() {
        let titles = assemble_titles(&BuildEnv::default());
        assert_eq!(titles, vec![Title::Fallback { title: None }]);
        assert_eq!(json(&titles), r#"[{"title":null}]"#);
    }
}
