// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use super::ranked_list::{RankedList, RankedListPage};
use super::traits::ExtractorSettings;

pub const MODULE: &str = "smartcall_top_media";

const SECTION: &str = "#__next > div > div:nth-child(3) > div > div.call_section > div:nth-child(3)";

/// 来电最多的媒体
pub const PAGE: RankedListPage = RankedListPage {
    module: MODULE,
    name_field: "media",
    wait_selector: SECTION,
    list_selector: "#__next > div > div:nth-child(3) > div > div.call_section > div:nth-child(3) div > ul",
};

pub fn extractor(settings: Arc<ExtractorSettings>) -> RankedList {
    RankedList::new(PAGE, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::scripted_session::ScriptedSession;
    use crate::extractors::test_support::{day, settings};
    use crate::extractors::traits::ExtractorTemplate;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_media_rows() {
        let session = ScriptedSession::new().with_element(SECTION).with_script(
            "div.call_section > div:nth-child(3) div > ul",
            json!([{"rank": "1", "name": "네이버 검색", "text": "1 네이버 검색 9", "fragments": []}]),
        );
        let template = extractor(settings());
        assert_eq!(template.name(), MODULE);

        let outcome = template.instantiate(day()).extract(&session).await;
        assert_eq!(outcome.records[0].get("media"), Some(&json!("네이버 검색")));
        assert_eq!(outcome.records[0].get("count"), Some(&json!(9)));
    }
}
