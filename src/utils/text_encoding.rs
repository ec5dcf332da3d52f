// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

/// 将响应字节解码为 UTF-8 文本
///
/// 优先使用 Content-Type 中声明的 charset，其次使用 chardetng 猜测，
/// 解码错误以替换字符处理，不会失败
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    if let Some(encoding) = content_type.and_then(charset_from_content_type) {
        let (decoded, _, _) = encoding.decode(bytes);
        return decoded.into_owned();
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    debug!("Detected body encoding: {}", encoding.name());

    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|part| {
            let (key, value) = part.split_once('=')?;
            if key.trim().eq_ignore_ascii_case("charset") {
                Some(value.trim().trim_matches('"'))
            } else {
                None
            }
        })
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| {
            // 无 charset 的 json 默认按 UTF-8
            content_type
                .to_ascii_lowercase()
                .contains("json")
                .then_some(UTF_8)
        })
}
