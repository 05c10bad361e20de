//! 变量替换
//!
//! 在分词之前扫描 `$NAME` 形式的片段并替换为 shell 变量的值。
//! `\$` 转义为字面 `$`；未定义的变量替换为空串。

/// 变量名字符：字母、数字、下划线
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// 对一行输入做变量替换
///
/// `lookup` 由调用方提供（shell 上下文的变量表）。
pub fn substitute_variables(expr: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let chars: Vec<char> = expr.chars().collect();
    let mut result = String::with_capacity(expr.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() && chars[i + 1] == '$' {
            result.push('$');
            i += 2;
            continue;
        }
        if c == '$' {
            let mut j = i + 1;
            while j < chars.len() && is_name_char(chars[j]) {
                j += 1;
            }
            if j > i + 1 {
                let name: String = chars[i + 1..j].iter().collect();
                if let Some(value) = lookup(&name) {
                    result.push_str(&value);
                }
                i = j;
                continue;
            }
            // 孤立的 `$` 保留原样
        }
        result.push(c);
        i += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("HOME".to_string(), "/home/u".to_string());
        map.insert("X_1".to_string(), "one".to_string());
        map
    }

    #[test]
    fn test_substitutes_known_variable() {
        let map = vars();
        let out = substitute_variables("cd $HOME/sub", |n| map.get(n).cloned());
        assert_eq!(out, "cd /home/u/sub");
    }

    #[test]
    fn test_unset_variable_becomes_empty() {
        let out = substitute_variables("print $NOPE!", |_| None);
        assert_eq!(out, "print !");
    }

    #[test]
    fn test_escaped_dollar_is_literal() {
        let map = vars();
        let out = substitute_variables(r"print \$HOME", |n| map.get(n).cloned());
        assert_eq!(out, "print $HOME");
    }

    #[test]
    fn test_lone_dollar_kept() {
        let out = substitute_variables("a $ b", |_| None);
        assert_eq!(out, "a $ b");
    }

    #[test]
    fn test_underscore_and_digits_in_name() {
        let map = vars();
        let out = substitute_variables("print $X_1", |n| map.get(n).cloned());
        assert_eq!(out, "print one");
    }
}
