// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use super::ranked_list::{RankedList, RankedListPage};
use super::traits::ExtractorSettings;

pub const MODULE: &str = "smartcall_top_keyword";

const LIST: &str = "#__next > div > div:nth-child(3) > div > div.call_section > div:nth-child(4) > div > ul";

/// 来电最多的搜索关键字
pub const PAGE: RankedListPage = RankedListPage {
    module: MODULE,
    name_field: "keyword",
    wait_selector: LIST,
    list_selector: LIST,
};

pub fn extractor(settings: Arc<ExtractorSettings>) -> RankedList {
    RankedList::new(PAGE, settings)
}
