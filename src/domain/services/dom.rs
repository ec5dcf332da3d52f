// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::{ElementRef, Html, Selector};

/// 按 CSS 选择器查找元素，选择器无效时返回空
pub fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// 在元素内部按 CSS 选择器查找后代
pub fn select_within<'a>(element: &ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => element.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// 第一个命中的选择器返回的全部元素
pub fn select_first_group<'a>(document: &'a Html, selectors: &[&str]) -> Vec<ElementRef<'a>> {
    selectors
        .iter()
        .map(|css| select_all(document, css))
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

/// 依次尝试多个选择器，返回第一个命中的元素
pub fn select_first<'a>(document: &'a Html, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .find_map(|css| select_all(document, css).into_iter().next())
}

/// 是否有任一选择器命中
pub fn any_match(document: &Html, selectors: &[&str]) -> bool {
    select_first(document, selectors).is_some()
}

/// 元素内的全部文本，空白折叠为单个空格
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 依次尝试多个选择器，返回第一个非空文本
pub fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        select_all(document, css)
            .iter()
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

/// 查找 meta 标签内容，匹配 name 或 property
pub fn meta_content(document: &Html, key: &str) -> Option<String> {
    select_all(document, "meta[content]")
        .into_iter()
        .find(|meta| {
            let element = meta.value();
            element
                .attr("name")
                .or_else(|| element.attr("property"))
                .or_else(|| element.attr("itemprop"))
                .is_some_and(|name| name.eq_ignore_ascii_case(key))
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}
