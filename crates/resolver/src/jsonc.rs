//! tsconfig files are JSON with comments and trailing commas; this turns them
//! into plain JSON before handing them to serde_json.

pub fn strip_jsonc(input: &str) -> String {
    strip_trailing_commas(&strip_comments(input))
}

fn strip_comments(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(ch) = chars.next() {
        if in_string {
            output.push(ch);
            match ch {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        output.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (ch, chars.peek()) {
            ('"', _) => {
                in_string = true;
                output.push(ch);
            }
            ('/', Some('/')) => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
                output.push(' ');
            }
            _ => output.push(ch),
        }
    }

    output
}

fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut output = String::with_capacity(input.len());
    let mut in_string = false;
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];
        if in_string {
            output.push(ch);
            if ch == '\\' {
                if let Some(&escaped) = chars.get(index + 1) {
                    output.push(escaped);
                    index += 1;
                }
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
            output.push(ch);
        } else if ch == ',' {
            let next = chars[index + 1..].iter().find(|c| !c.is_whitespace());
            if !matches!(next, Some('}' | ']')) {
                output.push(ch);
            }
        } else {
            output.push(ch);
        }
        index += 1;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_comments_outside_strings() {
        let input = r#"{
  // line comment
  "baseUrl": "./src", /* block */
  "paths": { "@app/*": ["./app/*"] },
  "url": "http://example.com/*not-a-comment*/"
}"#;
        let value: serde_json::Value = serde_json::from_str(&strip_jsonc(input)).unwrap();
        assert_eq!(value["baseUrl"], "./src");
        assert_eq!(value["url"], "http://example.com/*not-a-comment*/");
    }

    #[test]
    fn test_strips_trailing_commas() {
        let input = "{ \"a\": [1, 2,], \"b\": \",}\", }";
        let value: serde_json::Value = serde_json::from_str(&strip_jsonc(input)).unwrap();
        assert_eq!(value["a"], serde_json::json!([1, 2]));
        assert_eq!(value["b"], ",}");
    }
}
