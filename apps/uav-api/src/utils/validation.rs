//! 输入验证辅助函数
//!
//! 路径参数去除首尾空格后必须非空，失败返回 bad_request_error 响应。

use crate::utils::response::bad_request_error;
use axum::response::Response;

/// 验证必填字段，去除空格并检查非空
pub fn normalize_required(value: String, field: &str) -> Result<String, Response> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request_error(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::normalize_required;
    use axum::http::StatusCode;

    #[test]
    fn trims_and_rejects_blank() {
        assert_eq!(
            normalize_required(" UAV-1 ".to_string(), "uavCode").expect("valid"),
            "UAV-1"
        );
        let response = normalize_required("  ".to_string(), "uavCode").expect_err("blank");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
