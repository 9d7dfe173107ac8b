//! Splices resolved interface names back into a script
//!
//! Imports go right after the leading header block (license comment, pragma,
//! existing imports). Directive spans are replaced from the end of the text
//! backwards so earlier offsets stay valid.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::types::{Directive, Span};

pub const DEFAULT_IMPORT_PREFIX: &str = "interfaces";

#[derive(Debug, Clone)]
pub struct ScriptRewriter {
    import_prefix: String,
}

impl Default for ScriptRewriter {
    fn default() -> Self {
        Self::new(DEFAULT_IMPORT_PREFIX)
    }
}

impl ScriptRewriter {
    pub fn new(import_prefix: impl Into<String>) -> Self {
        let prefix: String = import_prefix.into();
        Self {
            import_prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn import_line(&self, name: &str) -> String {
        format!("import {{{name}}} from \"{}/{name}.sol\";", self.import_prefix)
    }

    /// Rewrite `original`, replacing every directive with its resolved name.
    /// Fails without producing output if any directive name is unresolved.
    pub fn rewrite(
        &self,
        original: &str,
        directives: &[Directive],
        resolved: &BTreeSet<String>,
    ) -> Result<String> {
        if let Some(missing) = directives.iter().find(|d| !resolved.contains(&d.name)) {
            return Err(Error::Resolution {
                name: missing.name.clone(),
                reason: "no resolved interface to substitute".to_string(),
            });
        }

        let used: BTreeSet<&str> = directives.iter().map(|d| d.name.as_str()).collect();
        let existing: BTreeSet<&str> = original.lines().map(str::trim).collect();
        let imports: String = used
            .iter()
            .map(|name| self.import_line(name))
            .filter(|line| !existing.contains(line.as_str()))
            .map(|line| line + "\n")
            .collect();

        let mut edits: Vec<(Span, String)> = directives
            .iter()
            .map(|d| (d.span, d.name.clone()))
            .collect();
        if !imports.is_empty() {
            let at = header_end(original);
            let needs_newline = at > 0 && !original[..at].ends_with('\n');
            let text = if needs_newline { format!("\n{imports}") } else { imports };
            edits.push((Span::new(at, at), text));
        }

        // Stable: at equal offsets a replacement is applied before the insertion
        edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));

        let mut output = original.to_string();
        for (span, text) in edits {
            output.replace_range(span.start..span.end, &text);
        }
        Ok(output)
    }
}

/// Byte offset just past the last pragma or import of the leading header
/// block, or 0 when the text has no header. Comments count as header only
/// before the first statement, so doc comments stay attached to what follows.
pub fn header_end(text: &str) -> usize {
    let mut end = 0;
    let mut offset = 0;
    let mut in_block_comment = false;
    let mut in_statement = false;
    let mut seen_statement = false;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        let line_end = offset + line.len();
        offset = line_end;

        if in_block_comment {
            if trimmed.contains("*/") {
                in_block_comment = false;
            }
            if !seen_statement {
                end = line_end;
            }
            continue;
        }
        if in_statement {
            if trimmed.contains(';') {
                in_statement = false;
            }
            end = line_end;
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with("//") {
            if !seen_statement {
                end = line_end;
            }
        } else if trimmed.starts_with("/*") {
            in_block_comment = !trimmed.contains("*/");
            if !seen_statement {
                end = line_end;
            }
        } else if is_header_statement(trimmed) {
            in_statement = !trimmed.contains(';');
            seen_statement = true;
            end = line_end;
        } else {
            break;
        }
    }
    end
}

fn is_header_statement(line: &str) -> bool {
    ["pragma", "import"].iter().any(|kw| {
        line.strip_prefix(kw)
            .is_some_and(|rest| rest.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '"' || c == '\''))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_span_integrity() {
        let text = "@DAI public token = @DAI(0x6B175474E89094C44Da98b954EedeAC495271d0F);";
        let directives = scan(text).directives;
        let output = ScriptRewriter::default()
            .rewrite(text, &directives, &names(&["DAI"]))
            .unwrap();
        assert_eq!(
            output,
            "import {DAI} from \"interfaces/DAI.sol\";\nDAI public token = DAI(0x6B175474E89094C44Da98b954EedeAC495271d0F);"
        );
    }

    #[test]
    fn test_imports_follow_header_block() {
        let text = "\
// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;

import {Script} from \"forge-std/Script.sol\";
import {
    Test
} from \"forge-std/Test.sol\";

contract Run is Script {
    function run() external {
        @WETH(0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2).deposit();
        @IERC20(token).approve(spender, 1);
    }
}
";
        let directives = scan(text).directives;
        let output = ScriptRewriter::default()
            .rewrite(text, &directives, &names(&["IERC20", "WETH"]))
            .unwrap();
        let expected = "\
// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;

import {Script} from \"forge-std/Script.sol\";
import {
    Test
} from \"forge-std/Test.sol\";
import {IERC20} from \"interfaces/IERC20.sol\";
import {WETH} from \"interfaces/WETH.sol\";

contract Run is Script {
    function run() external {
        WETH(0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2).deposit();
        IERC20(token).approve(spender, 1);
    }
}
";
        assert_eq!(output, expected);
        assert!(scan(&output).directives.is_empty());
    }

    #[test]
    fn test_existing_import_not_duplicated() {
        let text = "pragma solidity ^0.8.0;\nimport {DAI} from \"interfaces/DAI.sol\";\ncontract A { @DAI d; }\n";
        let directives = scan(text).directives;
        let output = ScriptRewriter::default()
            .rewrite(text, &directives, &names(&["DAI"]))
            .unwrap();
        assert_eq!(
            output,
            "pragma solidity ^0.8.0;\nimport {DAI} from \"interfaces/DAI.sol\";\ncontract A { DAI d; }\n"
        );
    }

    #[test]
    fn test_unresolved_name_is_an_error() {
        let text = "contract A { @DAI d; @USDC u; }";
        let directives = scan(text).directives;
        let err = ScriptRewriter::default()
            .rewrite(text, &directives, &names(&["DAI"]))
            .unwrap_err();
        assert!(matches!(err, Error::Resolution { name, .. } if name == "USDC"));
    }

    #[test]
    fn test_header_without_trailing_newline() {
        let text = "pragma solidity ^0.8.0;";
        assert_eq!(header_end(text), text.len());
        let output = ScriptRewriter::new("src/interfaces/")
            .rewrite(text, &[], &names(&[]))
            .unwrap();
        assert_eq!(output, text);
    }

    #[test]
    fn test_header_end_stops_at_code() {
        let text = "/* license\n   text */\npragma solidity 0.8.20;\n\ncontract A {}\n// trailing\n";
        assert_eq!(header_end(text), "/* license\n   text */\npragma solidity 0.8.20;\n".len());
        assert_eq!(header_end("contract A {}"), 0);
        assert_eq!(header_end("importer x;"), 0);
    }

    #[test]
    fn test_natspec_stays_with_its_contract() {
        let text = "\
// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;
import {Script} from \"forge-std/Script.sol\";

/// @title Deploy
/// @notice Deploys things
contract Deploy is Script { @IWETH w; }

/** @notice Helper */
contract Helper {}
";
        let directives = scan(text).directives;
        let output = ScriptRewriter::default()
            .rewrite(text, &directives, &names(&["IWETH"]))
            .unwrap();
        let expected = "\
// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;
import {Script} from \"forge-std/Script.sol\";
import {IWETH} from \"interfaces/IWETH.sol\";

/// @title Deploy
/// @notice Deploys things
contract Deploy is Script { IWETH w; }

/** @notice Helper */
contract Helper {}
";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_comment_between_imports_is_header() {
        let text = "pragma solidity ^0.8.0;\n// tools\nimport \"a.sol\";\n/** doc */\ncontract A {}\n";
        assert_eq!(
            header_end(text),
            "pragma solidity ^0.8.0;\n// tools\nimport \"a.sol\";\n".len()
        );
    }

    #[test]
    fn test_custom_prefix() {
        let rewriter = ScriptRewriter::new("src/interfaces/");
        assert_eq!(
            rewriter.import_line("DAI"),
            "import {DAI} from \"src/interfaces/DAI.sol\";"
        );
    }
}
