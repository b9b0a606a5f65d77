//! Functions callable from templates.
//!
//! | Name                 | Arguments          | Result                         |
//! | -------------------- | ------------------ | ------------------------------ |
//! | `trimN`, `pathTrimN` | path string, `n`   | path with `n` segments removed |

use serde_json::Value;

/// Calls the template function `name` with already evaluated arguments.
pub fn call(name: &str, args: Vec<Value>) -> Result<Value, String> {
    match name {
        "trimN" | "pathTrimN" => {
            let [path, n] = <[Value; 2]>::try_from(args)
                .map_err(|args| format!("{} wants 2 arguments, got {}", name, args.len()))?;
            let path = path
                .as_str()
                .ok_or_else(|| format!("{}: path must be a string, got {}", name, path))?;
            let n = n
                .as_i64()
                .ok_or_else(|| format!("{}: n must be an integer, got {}", name, n))?;
            trim_n(path, n).map(Value::String)
        }
        _ => Err(format!("function {:?} not defined", name)),
    }
}

/// Removes `n` leading path segments when `n > 0`, or `|n|` trailing ones when
/// `n < 0`. Empty segments are dropped and the rest joined with `/`.
pub fn trim_n(path: &str, n: i64) -> Result<String, String> {
    if n == 0 {
        return Ok(path.to_string());
    }

    let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    let count = usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX);
    if count > parts.len() {
        return Err(format!(
            "cannot trim {} segments from {:?} ({} segments)",
            count,
            path,
            parts.len()
        ));
    }

    let kept = if n > 0 {
        &parts[count..]
    } else {
        &parts[..parts.len() - count]
    };

    Ok(kept.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trim_n() {
        let cases = [
            ("", 0, ""),
            ("a", 0, "a"),
            ("a/b/c", 0, "a/b/c"),
            ("a/b/c", 1, "b/c"),
            ("a/b/c", -1, "a/b"),
            ("a/b/c/d/e", 4, "e"),
            ("a/b/c/d/e", -3, "a/b"),
            ("a/b/c", 3, ""),
            ("/a//b/c/", 1, "b/c"),
        ];

        for (path, n, want) in cases {
            assert_eq!(trim_n(path, n).unwrap(), want, "trim_n({:?}, {})", path, n);
        }
    }

    #[test]
    fn test_trim_n_too_many_segments() {
        assert!(trim_n("a/b", 3).is_err());
        assert!(trim_n("a/b", -3).is_err());
    }

    #[test]
    fn test_call_checks_arguments() {
        assert_eq!(
            call("trimN", vec![json!("a/b"), json!(1)]).unwrap(),
            json!("b")
        );
        assert!(call("trimN", vec![json!("a/b")]).is_err());
        assert!(call("trimN", vec![json!(1), json!(1)]).is_err());
        assert!(call("trimN", vec![json!("a/b"), json!("1")]).is_err());
        assert!(call("unknown", vec![]).is_err());
    }
}
