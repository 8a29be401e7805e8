//! conditional and partial GET evaluation.
//!
//! the keyset endpoint is CDN-facing, so it honors `If-Modified-Since`
//! against the cache timestamp and single byte ranges (`Range` with an
//! optional `If-Range` date validator) against the snapshot being served.
//! http dates carry second precision, so all comparisons truncate to
//! seconds.

use std::ops::Range;

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};

/// render a timestamp in the RFC 1123 fixed format http headers use.
pub fn http_date(t: DateTime<Utc>) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// parse an http date header value. RFC 2822 parsing covers the IMF-fixdate
/// form including the `GMT` zone name.
fn parse_http_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// whether an `If-Modified-Since` precondition makes a 304 appropriate.
/// a cache without a timestamp (empty store) is never "not modified".
pub fn not_modified(headers: &HeaderMap, last_modified: Option<DateTime<Utc>>) -> bool {
    let Some(last_modified) = last_modified else {
        return false;
    };
    let Some(since) = headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date)
    else {
        return false;
    };

    last_modified.timestamp() <= since.timestamp()
}

/// how a request's range headers apply to a body of `len` bytes.
#[derive(Debug, PartialEq, Eq)]
pub enum RangeOutcome {
    /// serve the whole body with 200
    Full,
    /// serve this slice with 206
    Partial(Range<usize>),
    /// respond 416 with `Content-Range: bytes */len`
    Unsatisfiable,
}

/// evaluate `Range` and `If-Range` for the current snapshot.
///
/// only single byte ranges are honored; multi-range and unparseable
/// headers fall back to the full body, which RFC 9110 permits. an
/// `If-Range` date that no longer matches the snapshot's timestamp also
/// falls back to the full body.
pub fn evaluate_range(
    headers: &HeaderMap,
    last_modified: Option<DateTime<Utc>>,
    len: usize,
) -> RangeOutcome {
    let Some(spec) = headers.get(header::RANGE).and_then(|v| v.to_str().ok()) else {
        return RangeOutcome::Full;
    };

    if let Some(validator) = headers.get(header::IF_RANGE).and_then(|v| v.to_str().ok()) {
        let still_valid = match (parse_http_date(validator), last_modified) {
            (Some(at), Some(lm)) => lm.timestamp() == at.timestamp(),
            _ => false,
        };
        if !still_valid {
            return RangeOutcome::Full;
        }
    }

    parse_byte_range(spec, len)
}

/// parse a `bytes=` range spec against a body of `len` bytes.
fn parse_byte_range(spec: &str, len: usize) -> RangeOutcome {
    let Some(ranges) = spec.strip_prefix("bytes=") else {
        return RangeOutcome::Full;
    };
    if ranges.contains(',') {
        // multi-range would need a multipart body; serve the full keyset
        return RangeOutcome::Full;
    }

    let Some((start, end)) = ranges.trim().split_once('-') else {
        return RangeOutcome::Full;
    };

    // suffix form: last n bytes
    if start.is_empty() {
        let Ok(n) = end.parse::<usize>() else {
            return RangeOutcome::Full;
        };
        if n == 0 || len == 0 {
            return RangeOutcome::Unsatisfiable;
        }
        let n = n.min(len);
        return RangeOutcome::Partial(len - n..len);
    }

    let Ok(first) = start.parse::<usize>() else {
        return RangeOutcome::Full;
    };
    if first >= len {
        return RangeOutcome::Unsatisfiable;
    }

    let last = if end.is_empty() {
        len - 1
    } else {
        match end.parse::<usize>() {
            Ok(last) if last >= first => last.min(len - 1),
            // syntactically invalid, ignore the header
            _ => return RangeOutcome::Full,
        }
    };

    RangeOutcome::Partial(first..last + 1)
}
