//! 通用工具函数

use crate::error::{CallError, Result};

/// 患者ID固定长度
pub const PATIENT_ID_LEN: usize = 7;

/// 验证患者ID格式（固定长度数字串）
pub fn is_valid_patient_id(id: &str) -> bool {
    id.len() == PATIENT_ID_LEN && id.chars().all(|c| c.is_ascii_digit())
}

/// 解析边界输入的受理号码
///
/// 核心内部统一使用整数表示号码，字符串仅存在于输入边界。
pub fn parse_reception_number(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    let number: u32 = trimmed
        .parse()
        .map_err(|_| CallError::InvalidNumber(trimmed.to_string()))?;
    if number == 0 {
        return Err(CallError::InvalidNumber(trimmed.to_string()));
    }
    Ok(number)
}
