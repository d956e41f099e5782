//! File-system backed runs of the whole rewrite pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use resolver::{FsResolver, ResolutionConfig};
use rewrite::{FileEngine, FileOutcome, PathStyle, RewriteError};
use tempfile::{tempdir, TempDir};

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    for (relative, content) in files {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn lf_config(root: &Path) -> ResolutionConfig {
    let mut config = ResolutionConfig::new(root);
    config.newline = Some(resolver::NewLine::Lf);
    config
}

fn run(config: &ResolutionConfig, path: &Path) -> Result<FileOutcome, RewriteError> {
    let source = fs::read_to_string(path).unwrap();
    let resolver = FsResolver::new(config);
    FileEngine::new(config, &resolver, PathStyle::Compatible).transform(path, &source)
}

fn rewritten(outcome: Result<FileOutcome, RewriteError>) -> String {
    match outcome {
        Ok(FileOutcome::Rewritten(text)) => text,
        other => panic!("expected a rewrite, got {other:?}"),
    }
}

#[test]
fn test_directory_import_gets_index_file() {
    let dir = project(&[
        ("src/main.ts", "import { A } from './A';\n"),
        ("src/A/index.ts", "export const A = 1;\n"),
    ]);
    let config = lf_config(dir.path());

    let output = rewritten(run(&config, &dir.path().join("src/main.ts")));
    assert_eq!(output, "import { A } from \"./A/index.ts\";\n");
}

#[test]
fn test_react_app_entry() {
    let app = r#"import React from "react";
import { createRoot } from "react-dom/client";
import { ComponentA } from "./ComponentA";
import { ComponentB } from "./ComponentB";
import { ComponentC } from "./ComponentC.js";

createRoot(document.getElementById("root") as HTMLElement)
  .render(
    <React.StrictMode>
      <ComponentA />
      <ComponentB />
      <ComponentC />
    </React.StrictMode>,
  );
"#;
    let dir = project(&[
        ("src/App.tsx", app),
        ("src/ComponentA/index.ts", "export * from './ComponentA';\n"),
        ("src/ComponentA/ComponentA.tsx", "export const ComponentA = () => null;\n"),
        ("src/ComponentB.tsx", "export const ComponentB = () => null;\n"),
        ("src/ComponentC.tsx", "export const ComponentC = () => null;\n"),
        ("node_modules/react/index.js", "module.exports = {};\n"),
        ("node_modules/react-dom/client.js", "module.exports = {};\n"),
    ]);
    let config = lf_config(dir.path());
    let path = dir.path().join("src/App.tsx");

    let expected = app
        .replace("\"./ComponentA\"", "\"./ComponentA/index.ts\"")
        .replace("\"./ComponentB\"", "\"./ComponentB.tsx\"")
        .replace("\"./ComponentC.js\"", "\"./ComponentC.tsx\"");
    assert_eq!(rewritten(run(&config, &path)), expected);
}

#[test]
fn test_second_run_is_a_no_op() {
    let dir = project(&[
        ("src/main.ts", "import a from './a';\nexport * from '../lib/b';\n"),
        ("src/a.ts", "export default 1;\n"),
        ("lib/b.mts", "export const b = 2;\n"),
    ]);
    let config = lf_config(dir.path());
    let path = dir.path().join("src/main.ts");

    let output = rewritten(run(&config, &path));
    assert_eq!(output, "import a from \"./a.ts\";\nexport * from \"../lib/b.mts\";\n");

    fs::write(&path, &output).unwrap();
    assert_eq!(run(&config, &path), Ok(FileOutcome::Unchanged));
}

#[test]
fn test_external_only_file_is_unchanged() {
    let dir = project(&[(
        "src/main.ts",
        "import fs from 'node:fs';\nimport lodash from 'lodash';\nconst x = import('https://esm.sh/preact');\n",
    )]);
    let config = lf_config(dir.path());
    assert_eq!(run(&config, &dir.path().join("src/main.ts")), Ok(FileOutcome::Unchanged));
}

#[test]
fn test_literals_text_and_layout_survive() {
    let source = "import { f } from './f';\n\
\n\
\n\
export const big = 0o777777777777n;\n\
export const n = 100_000 + 0x00111;\n\
\n\
export const face = '😎';\n\
export const greeting = 'こんにちは';\n\
export const lazy = () => import('./f');\n";
    let dir = project(&[("src/main.ts", source), ("src/f.ts", "export const f = 0;\n")]);
    let config = lf_config(dir.path());

    let expected = "import { f } from \"./f.ts\";\n\
\n\
\n\
export const big = 0o777777777777n;\n\
export const n = 100_000 + 0x00111;\n\
\n\
export const face = \"😎\";\n\
export const greeting = \"こんにちは\";\n\
export const lazy = () => import(\"./f.ts\");\n";
    assert_eq!(rewritten(run(&config, &dir.path().join("src/main.ts"))), expected);
}

#[test]
fn test_jsx_text_attributes_and_template_imports() {
    let source = r#"import { A } from './A';

export const P = () => <p>It's Bob's day</p>;
export const Link = () => <a title='C:\dir' href="x">{'x'}</a>;
export const page = `${await import('./A')}`;
"#;
    let dir = project(&[
        ("src/page.jsx", source),
        ("src/A.jsx", "export const A = 1;\n"),
    ]);
    let config = lf_config(dir.path());

    let expected = r#"import { A } from "./A.jsx";

export const P = () => <p>It's Bob's day</p>;
export const Link = () => <a title='C:\dir' href="x">{"x"}</a>;
export const page = `${await import("./A.jsx")}`;
"#;
    assert_eq!(rewritten(run(&config, &dir.path().join("src/page.jsx"))), expected);
}

#[test]
fn test_tsconfig_aliases_become_relative_paths() {
    let dir = project(&[
        (
            "tsconfig.json",
            r#"{
  // aliases for the app
  "compilerOptions": {
    "baseUrl": ".",
    "paths": { "@/*": ["src/*"] },
    "newLine": "crlf",
  }
}"#,
        ),
        ("src/pages/home.ts", "import { button } from '@/ui/button';\n"),
        ("src/ui/button.tsx", "export const button = 0;\n"),
    ]);
    let config = ResolutionConfig::load(&dir.path().join("tsconfig.json"), dir.path()).unwrap();

    let output = rewritten(run(&config, &dir.path().join("src/pages/home.ts")));
    assert_eq!(output, "import { button } from \"../ui/button.tsx\";\r\n");
}

#[test]
fn test_unresolvable_specifier_fails_the_file() {
    let source = "import { a } from './a';\nimport { gone } from './gone';\n";
    let dir = project(&[("src/main.ts", source), ("src/a.ts", "export const a = 0;\n")]);
    let config = lf_config(dir.path());

    let error = run(&config, &dir.path().join("src/main.ts")).unwrap_err();
    let start = source.find("'./gone'").unwrap();
    assert_eq!(error.to_string(), "cannot resolve module specifier \"./gone\"");
    assert_eq!(error.span().range(), start..start + "'./gone'".len());
}

#[test]
fn test_resolved_paths_are_reported_as_written() {
    let dir = project(&[("a/b.ts", "")]);
    let config = lf_config(dir.path());
    let resolver = FsResolver::new(&config);
    let probed: Option<PathBuf> = resolver.probe(&dir.path().join("a/b"));
    assert_eq!(probed, Some(dir.path().join("a/b.ts")));
}
