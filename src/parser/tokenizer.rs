//! 分词器
//!
//! 把一行输入按未转义的空格切分为有序片段，双引号内的空格不切分。
//! 引号内 `\"` 产生字面引号且不结束引号段；行尾未闭合的引号隐式闭合。
//! 分词永不失败，畸形的引号退化为尽力而为的切分。

use crate::parser::types::Segment;

/// 引号感知切分
///
/// 输入先做两端修剪；全空白输入产生空序列。
/// 每个片段记录其在修剪后文本中的字符偏移，供诊断定位。
pub fn split_expr(text: &str) -> Vec<Segment> {
    let text = text.trim();
    let mut segments = Vec::new();
    let mut current = String::new();
    // 片段起点；None 表示当前没有累积中的片段
    let mut start: Option<usize> = None;
    let mut in_quoted = false;
    let mut prev = ' ';

    for (index, c) in text.chars().enumerate() {
        if !in_quoted {
            if c == ' ' {
                if let Some(offset) = start.take() {
                    segments.push(Segment::new(std::mem::take(&mut current), offset));
                }
            } else if c == '"' {
                in_quoted = true;
                start.get_or_insert(index);
            } else {
                start.get_or_insert(index);
                current.push(c);
            }
        } else if c == '"' {
            if prev == '\\' {
                // 转义引号：去掉已累积的反斜杠，保留字面引号
                current.pop();
                current.push('"');
            } else {
                in_quoted = false;
            }
        } else {
            current.push(c);
        }
        prev = c;
    }

    if let Some(offset) = start {
        segments.push(Segment::new(current, offset));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(segments: &[Segment]) -> Vec<&str> {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_plain_split() {
        let segments = split_expr("help -s history");
        assert_eq!(texts(&segments), vec!["help", "-s", "history"]);
        assert_eq!(segments[0].offset, 0);
        assert_eq!(segments[1].offset, 5);
        assert_eq!(segments[2].offset, 8);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(split_expr("").is_empty());
        assert!(split_expr("   \t  ").is_empty());
    }

    #[test]
    fn test_consecutive_spaces_produce_no_empty_segments() {
        let segments = split_expr("a   b");
        assert_eq!(texts(&segments), vec!["a", "b"]);
    }

    #[test]
    fn test_quoted_segment_keeps_spaces() {
        let segments = split_expr("prompt \"my shell> \"");
        assert_eq!(texts(&segments), vec!["prompt", "my shell> "]);
    }

    #[test]
    fn test_escaped_quote_stays_inside_segment() {
        let segments = split_expr(r#"a "b\"c" d"#);
        assert_eq!(texts(&segments), vec!["a", "b\"c", "d"]);
    }

    #[test]
    fn test_unterminated_quote_implicitly_closed() {
        let segments = split_expr(r#"print "hello world"#);
        assert_eq!(texts(&segments), vec!["print", "hello world"]);
    }

    #[test]
    fn test_quoted_empty_segment() {
        let segments = split_expr(r#"print "" x"#);
        assert_eq!(texts(&segments), vec!["print", "", "x"]);
    }

    #[test]
    fn test_idempotence_without_quotes() {
        // 对不含引号的输入，切分-拼接-再切分应当稳定
        for input in ["a b c", "  help   -s  ", "one", "! -1"] {
            let first = split_expr(input);
            let joined = first
                .iter()
                .map(|s| s.text.clone())
                .collect::<Vec<_>>()
                .join(" ");
            let second = split_expr(&joined);
            assert_eq!(texts(&first), texts(&second));
        }
    }
}
