use bigdecimal::{BigDecimal, ToPrimitive};
use serde::Serializer;
use std::str::FromStr;

/// 扣款比例除数 (所有扣款与差异均按 1/10 计)
pub const DEDUCTION_DIVISOR: i64 = 10;

pub fn divisor() -> BigDecimal {
    BigDecimal::from(DEDUCTION_DIVISOR)
}

/// 解析金额/数量文本, 支持 "$1,234.50"、"-12" 等写法
pub fn parse_decimal(raw: &str) -> Option<BigDecimal> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let cleaned: String = body
        .strip_prefix('$')
        .unwrap_or(body)
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let value = BigDecimal::from_str(&cleaned).ok()?;
    Some(if negative { -value } else { value })
}

/// 浮点单元格转十进制: 以最短往返表示为准, 避免二进制尾数
pub fn decimal_from_f64(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    BigDecimal::from_str(&value.to_string()).ok()
}

/// 十进制按 JSON 数字输出
pub fn serialize_as_f64<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(value.to_f64().unwrap_or(0.0))
}

pub fn serialize_option_as_f64<S>(value: &Option<BigDecimal>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_f64(v.to_f64().unwrap_or(0.0)),
        None => serializer.serialize_none(),
    }
}
