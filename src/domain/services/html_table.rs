// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::models::record::ScrapedRecord;

/// 从服务端渲染的 HTML 中解析出的表格
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableGrid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableGrid {
    /// 列名
    ///
    /// 表头与首行列数一致时直接使用表头；否则在表头之后补 `Column_i`，
    /// 没有表头时全部使用 `Column_i`。
    pub fn column_names(&self) -> Vec<String> {
        let max_cols = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let first_cols = self.rows.first().map(Vec::len).unwrap_or(0);
        if !self.headers.is_empty() && self.headers.len() == first_cols {
            return self.headers.clone();
        }
        let start = self.headers.len().min(max_cols);
        self.headers
            .iter()
            .take(max_cols)
            .cloned()
            .chain((start..max_cols).map(|i| format!("Column_{}", i)))
            .collect()
    }

    /// 转成记录，短行的缺失单元格为 null
    pub fn records(&self) -> Vec<ScrapedRecord> {
        let names = self.column_names();
        self.rows
            .iter()
            .map(|row| {
                names
                    .iter()
                    .enumerate()
                    .fold(ScrapedRecord::new(), |record, (i, name)| {
                        let cell = row.get(i).cloned().map(Value::String).unwrap_or(Value::Null);
                        record.with(name.clone(), cell)
                    })
            })
            .collect()
    }
}

/// 按顺序尝试选择器，解析第一个匹配的表格
///
/// 表头取 `thead th`，数据行取 `tbody tr` 中的 `td`，空行被丢弃。
pub fn parse_table(html: &str, selectors: &[&str]) -> Option<TableGrid> {
    let document = Html::parse_document(html);
    let table = selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| document.select(&selector).next())?;

    let headers = select_all(table, "thead th").map(cell_text).collect();
    let rows = select_all(table, "tbody tr")
        .map(|tr| select_all(tr, "td").map(cell_text).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();
    Some(TableGrid { headers, rows })
}

/// 左侧固定列与右侧滚动列分开渲染的表格
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitTable {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub index_rows: Vec<Vec<String>>,
    #[serde(default)]
    pub data_rows: Vec<Vec<String>>,
}

impl SplitTable {
    /// 逐行拼接固定列与滚动列，再按表头命名
    ///
    /// 行数不一致时以较长的一侧为准；拼接后全空的行被丢弃。
    pub fn merge(&self) -> Vec<ScrapedRecord> {
        let total = self.index_rows.len().max(self.data_rows.len());
        (0..total)
            .filter_map(|i| {
                let combined: Vec<&String> = self
                    .index_rows
                    .get(i)
                    .into_iter()
                    .flatten()
                    .chain(self.data_rows.get(i).into_iter().flatten())
                    .collect();
                if combined.iter().all(|cell| cell.is_empty()) {
                    return None;
                }
                let record = self
                    .headers
                    .iter()
                    .zip(combined)
                    .fold(ScrapedRecord::new(), |record, (header, cell)| {
                        record.with(header.clone(), cell.clone())
                    });
                Some(record)
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.index_rows.is_empty() && self.data_rows.is_empty()
    }
}

/// 从 HTML 中解析固定列/滚动列表格
///
/// 固定表格的 `thead` 第一行是索引列表头、最后一行是数据列表头，其余行是索引列数据；
/// 没取到表头时改用滚动表格 `thead` 的最后一行。
pub fn parse_split_table(html: &str, fixed_selector: &str, scroll_selector: &str) -> SplitTable {
    let document = Html::parse_document(html);
    let mut table = SplitTable::default();

    if let Some(fixed) = first_match(&document, fixed_selector) {
        let header_rows: Vec<ElementRef> = select_all(fixed, "thead tr").collect();
        if let Some(first) = header_rows.first() {
            table.headers = header_cells(*first);
            if header_rows.len() > 1 {
                if let Some(last) = header_rows.last() {
                    table.headers.extend(header_cells(*last));
                }
            }
        }
        table.index_rows = header_rows
            .iter()
            .skip(1)
            .map(|tr| row_cells(*tr))
            .filter(|row| !row.is_empty())
            .collect();
    }

    if let Some(scroll) = first_match(&document, scroll_selector) {
        if table.headers.is_empty() {
            if let Some(last) = select_all(scroll, "thead tr").last() {
                table.headers = header_cells(last);
            }
        }
        let body_rows: Vec<Vec<String>> = select_all(scroll, "tbody tr").map(row_cells).collect();
        let rows = if body_rows.is_empty() {
            select_all(scroll, "tr").skip(1).map(row_cells).collect()
        } else {
            body_rows
        };
        table.data_rows = rows
            .into_iter()
            .filter(|row| !row.is_empty() && row.iter().any(|c| !c.is_empty()))
            .collect();
    }

    table
}

fn first_match<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn select_all<'a>(element: ElementRef<'a>, selector: &str) -> impl Iterator<Item = ElementRef<'a>> {
    let selector = Selector::parse(selector).ok();
    selector
        .map(|s| element.select(&s).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
}

/// `th` 优先，没有时取 `td`
fn header_cells(row: ElementRef) -> Vec<String> {
    let cells: Vec<String> = select_all(row, "th").map(cell_text).collect();
    if cells.is_empty() {
        row_cells(row)
    } else {
        cells
    }
}

fn row_cells(row: ElementRef) -> Vec<String> {
    select_all(row, "td").map(cell_text).collect()
}

/// 各文本片段去空白后直接拼接
fn cell_text(element: ElementRef) -> String {
    element.text().map(str::trim).collect()
}
