// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The Go runtime library embedded in every generated file.
//!
//! Generated method bodies only call helpers defined here plus a handful of
//! standard-library functions from the common import set. Go rejects unused
//! imports, so every package in [`COMMON_IMPORTS`] is referenced by the
//! common sections below, and each mode's extra imports by that mode's
//! section.
//!
//! The library is split by concern:
//!
//! - [`VALUES`]: text, number, boolean and JSON coercions
//! - [`COLLECTIONS`]: copying array and object operations
//! - [`PRIMITIVES`]: support for the primitive registry and class primitives
//! - [`INTERPRETER`]: calls back into the interpreter for fallback sends
//! - [`PROTOCOL`]: the request/response wire format shared by both modes
//! - [`STANDALONE`] / [`PLUGIN`]: the mode-specific entry points

use super::EmitMode;
use super::document::{Document, line};
use crate::docvec;

/// Imports every generated file needs.
pub const COMMON_IMPORTS: &[&str] = &[
    "bufio",
    "encoding/json",
    "fmt",
    "os",
    "os/exec",
    "path/filepath",
    "sort",
    "strconv",
    "strings",
];

/// Extra imports of a standalone program.
pub const STANDALONE_IMPORTS: &[&str] = &["database/sql"];

/// The SQLite driver, imported for its side effect.
pub const SQLITE_DRIVER: &str = "modernc.org/sqlite";

/// The import block for a mode.
pub(super) fn imports(mode: EmitMode) -> Document<'static> {
    let mut specs: Vec<Document<'static>> = COMMON_IMPORTS
        .iter()
        .chain(match mode {
            EmitMode::Binary => STANDALONE_IMPORTS,
            EmitMode::Plugin => &[],
        })
        .map(|path| Document::String(format!("\t\"{path}\"")))
        .collect();
    if mode == EmitMode::Binary {
        specs.push(Document::String(format!("\n\t_ \"{SQLITE_DRIVER}\"")));
    }

    let mut docs = Vec::new();
    if mode == EmitMode::Plugin {
        docs.push(docvec!["import \"C\"", line(), line()]);
    }
    docs.push(docvec!["import ("]);
    for spec in specs {
        docs.push(docvec![line(), spec]);
    }
    docs.push(docvec![line(), ")"]);
    Document::Vec(docs)
}

/// The runtime sections for a mode, in emission order.
pub(super) fn sections(mode: EmitMode) -> Vec<&'static str> {
    let mut sections = vec![VALUES, COLLECTIONS, PRIMITIVES, INTERPRETER, PROTOCOL];
    sections.push(match mode {
        EmitMode::Binary => STANDALONE,
        EmitMode::Plugin => PLUGIN,
    });
    sections
}

pub const VALUES: &str = r#"// --- value coercions ---

func _toInt(s string) int {
	s = strings.TrimSpace(s)
	if n, err := strconv.Atoi(s); err == nil {
		return n
	}
	return 0
}

func _div(a, b int) int {
	if b == 0 {
		return 0
	}
	return a / b
}

func _truthy(s string) bool {
	switch strings.TrimSpace(s) {
	case "", "0", "false", "nil", "null":
		return false
	}
	return true
}

func _boolText(b bool) string {
	if b {
		return "true"
	}
	return "false"
}

func _boolInt(b bool) int {
	if b {
		return 1
	}
	return 0
}

func _isNil(s string) bool {
	switch strings.TrimSpace(s) {
	case "", "nil", "null":
		return true
	}
	return false
}

func _jsonText(v interface{}) string {
	switch x := v.(type) {
	case nil:
		return ""
	case string:
		return x
	case bool:
		return _boolText(x)
	case int:
		return strconv.Itoa(x)
	case float64:
		return strconv.FormatFloat(x, 'f', -1, 64)
	}
	data, err := json.Marshal(v)
	if err != nil {
		return ""
	}
	return string(data)
}

func _parseJSON(s string) interface{} {
	trimmed := strings.TrimSpace(s)
	if trimmed == "" {
		return nil
	}
	var v interface{}
	if err := json.Unmarshal([]byte(trimmed), &v); err != nil {
		return s
	}
	return v
}

func _toValue(s string) interface{} {
	trimmed := strings.TrimSpace(s)
	if strings.HasPrefix(trimmed, "[") || strings.HasPrefix(trimmed, "{") {
		var v interface{}
		if err := json.Unmarshal([]byte(trimmed), &v); err == nil {
			return v
		}
	}
	return s
}

func _decodeObject(raw string) (map[string]interface{}, error) {
	obj := map[string]interface{}{}
	if strings.TrimSpace(raw) == "" {
		return obj, nil
	}
	if err := json.Unmarshal([]byte(raw), &obj); err != nil {
		return nil, fmt.Errorf("decoding %s state: %w", _className, err)
	}
	return obj, nil
}"#;

pub const COLLECTIONS: &str = r#"// --- collections ---

func _toArray(v interface{}) []interface{} {
	switch x := v.(type) {
	case []interface{}:
		return x
	case string:
		if arr, ok := _parseJSON(x).([]interface{}); ok {
			return arr
		}
	}
	return []interface{}{}
}

func _toObject(v interface{}) map[string]interface{} {
	switch x := v.(type) {
	case map[string]interface{}:
		return x
	case string:
		if obj, ok := _parseJSON(x).(map[string]interface{}); ok {
			return obj
		}
	}
	return map[string]interface{}{}
}

func _arrayPush(v interface{}, items ...interface{}) []interface{} {
	arr := _toArray(v)
	out := make([]interface{}, 0, len(arr)+len(items))
	out = append(out, arr...)
	return append(out, items...)
}

func _arrayFirst(v interface{}) interface{} {
	arr := _toArray(v)
	if len(arr) == 0 {
		return nil
	}
	return arr[0]
}

func _arrayLast(v interface{}) interface{} {
	arr := _toArray(v)
	if len(arr) == 0 {
		return nil
	}
	return arr[len(arr)-1]
}

func _arrayAt(v interface{}, i int) interface{} {
	arr := _toArray(v)
	if i < 0 || i >= len(arr) {
		return nil
	}
	return arr[i]
}

func _arrayAtPut(v interface{}, i int, item interface{}) []interface{} {
	arr := _toArray(v)
	out := make([]interface{}, len(arr), len(arr)+1)
	copy(out, arr)
	switch {
	case i >= 0 && i < len(out):
		out[i] = item
	case i == len(out):
		out = append(out, item)
	}
	return out
}

func _arrayRemoveAt(v interface{}, i int) []interface{} {
	arr := _toArray(v)
	out := make([]interface{}, 0, len(arr))
	for j, item := range arr {
		if j != i {
			out = append(out, item)
		}
	}
	return out
}

func _objectKeys(v interface{}) []interface{} {
	obj := _toObject(v)
	keys := make([]string, 0, len(obj))
	for k := range obj {
		keys = append(keys, k)
	}
	sort.Strings(keys)
	out := make([]interface{}, len(keys))
	for i, k := range keys {
		out[i] = k
	}
	return out
}

func _objectValues(v interface{}) []interface{} {
	obj := _toObject(v)
	keys := _objectKeys(obj)
	out := make([]interface{}, len(keys))
	for i, k := range keys {
		out[i] = obj[k.(string)]
	}
	return out
}

func _objectAt(v interface{}, key string) interface{} {
	return _toObject(v)[key]
}

func _objectAtPut(v interface{}, key string, item interface{}) map[string]interface{} {
	obj := _toObject(v)
	out := make(map[string]interface{}, len(obj)+1)
	for k, x := range obj {
		out[k] = x
	}
	out[key] = item
	return out
}

func _objectRemoveKey(v interface{}, key string) map[string]interface{} {
	obj := _toObject(v)
	out := make(map[string]interface{}, len(obj))
	for k, x := range obj {
		if k != key {
			out[k] = x
		}
	}
	return out
}

func _objectHasKey(v interface{}, key string) bool {
	_, ok := _toObject(v)[key]
	return ok
}"#;

pub const PRIMITIVES: &str = r#"// --- primitives ---

func _ok(s string) (string, error) {
	return s, nil
}

func _boolResult(b bool) (string, error) {
	return _boolText(b), nil
}

func _fileRead(path string) (string, error) {
	data, err := os.ReadFile(path)
	if err != nil {
		return "", err
	}
	return string(data), nil
}

func _fileWrite(path, data string) (string, error) {
	if err := os.WriteFile(path, []byte(data), 0o644); err != nil {
		return "", err
	}
	return "", nil
}

func _fileAppend(path, data string) (string, error) {
	f, err := os.OpenFile(path, os.O_APPEND|os.O_CREATE|os.O_WRONLY, 0o644)
	if err != nil {
		return "", err
	}
	defer f.Close()
	if _, err := f.WriteString(data); err != nil {
		return "", err
	}
	return "", nil
}

func _fileDelete(path string) (string, error) {
	if err := os.Remove(path); err != nil {
		return "", err
	}
	return "", nil
}

func _fileExists(path string) bool {
	_, err := os.Stat(path)
	return err == nil
}

func _isFile(path string) bool {
	info, err := os.Stat(path)
	return err == nil && info.Mode().IsRegular()
}

func _isDir(path string) bool {
	info, err := os.Stat(path)
	return err == nil && info.IsDir()
}

func _basename(path string) string {
	return filepath.Base(path)
}

func _dirname(path string) string {
	return filepath.Dir(path)
}

func _fileLines(path string) (string, error) {
	data, err := os.ReadFile(path)
	if err != nil {
		return "", err
	}
	lines := []string{}
	if text := strings.TrimSuffix(string(data), "\n"); text != "" {
		lines = strings.Split(text, "\n")
	}
	out, err := json.Marshal(lines)
	if err != nil {
		return "", err
	}
	return string(out), nil
}

func _envSet(name, value string) (string, error) {
	if err := os.Setenv(name, value); err != nil {
		return "", err
	}
	return value, nil
}

func _envHas(name string) bool {
	_, ok := os.LookupEnv(name)
	return ok
}

func _envUnset(name string) (string, error) {
	if err := os.Unsetenv(name); err != nil {
		return "", err
	}
	return "", nil
}

func _stringSplit(s, sep string) (string, error) {
	out, err := json.Marshal(strings.Split(s, sep))
	if err != nil {
		return "", err
	}
	return string(out), nil
}

func _consolePrint(s string, newline bool) (string, error) {
	if newline {
		s += "\n"
	}
	if _, err := fmt.Fprint(os.Stdout, s); err != nil {
		return "", err
	}
	return "", nil
}

var _stdin = bufio.NewReader(os.Stdin)

func _consoleReadLine() (string, error) {
	line, err := _stdin.ReadString('\n')
	if err != nil && line == "" {
		return "", nil
	}
	return strings.TrimRight(line, "\r\n"), nil
}

func _consoleError(s string) (string, error) {
	if _, err := fmt.Fprintln(os.Stderr, s); err != nil {
		return "", err
	}
	return "", nil
}"#;

pub const INTERPRETER: &str = r#"// --- interpreter fallback ---

func _interpreter() string {
	if path := os.Getenv("TALK_INTERPRETER"); path != "" {
		return path
	}
	return _defaultInterpreter
}

func _arityError(selector string, want, got int) error {
	return fmt.Errorf("%s>>%s expects %d argument(s), got %d", _className, selector, want, got)
}

func _sendMessage(receiver string, selector string, args ...string) (string, error) {
	cmd := exec.Command(_interpreter(), append([]string{receiver, selector}, args...)...)
	cmd.Stderr = os.Stderr
	out, err := cmd.Output()
	if err != nil {
		return "", fmt.Errorf("%s %s: %w", receiver, selector, err)
	}
	return strings.TrimSuffix(string(out), "\n"), nil
}

func _invokeBlock(block string, args ...string) (string, error) {
	selector := "value"
	if len(args) > 0 {
		selector = strings.Repeat("value_", len(args))
	}
	return _sendMessage(block, selector, args...)
}"#;

pub const PROTOCOL: &str = r#"// --- dispatch protocol ---

type _receiver interface {
	load(raw string) error
	dispatch(selector string, args []string) (string, bool, error)
	responds(selector string) bool
}

type _request struct {
	Class    string          `json:"class"`
	Instance json.RawMessage `json:"instance,omitempty"`
	Selector string          `json:"selector"`
	Args     []string        `json:"args"`
	ID       string          `json:"id,omitempty"`
}

type _response struct {
	Instance json.RawMessage `json:"instance,omitempty"`
	Result   *string         `json:"result,omitempty"`
	ExitCode int             `json:"exit_code"`
	Error    string          `json:"error,omitempty"`
}

func _encodeResponse(resp _response) string {
	data, err := json.Marshal(resp)
	if err != nil {
		return `{"exit_code":1,"error":"encoding response failed"}`
	}
	return string(data)
}

func _failure(err error) string {
	return _encodeResponse(_response{ExitCode: 1, Error: err.Error()})
}

// _instanceJSON returns the object text of a request instance. An empty,
// null or empty-string instance addresses the class side.
func _instanceJSON(raw json.RawMessage) (string, bool) {
	trimmed := strings.TrimSpace(string(raw))
	if trimmed == "" || trimmed == "null" || trimmed == `""` {
		return "", false
	}
	if strings.HasPrefix(trimmed, `"`) {
		var inner string
		if err := json.Unmarshal([]byte(trimmed), &inner); err == nil {
			return inner, true
		}
	}
	return trimmed, true
}

func _handleRequest(line string) string {
	var req _request
	if err := json.Unmarshal([]byte(line), &req); err != nil {
		return _failure(fmt.Errorf("invalid request: %w", err))
	}
	if req.Class != "" && req.Class != _className {
		return _encodeResponse(_response{ExitCode: 200})
	}
	raw, isInstance := _instanceJSON(req.Instance)
	id := req.ID
	if !isInstance {
		id = _className
	}
	recv := _receiverFor(id)
	if !recv.responds(req.Selector) {
		return _encodeResponse(_response{ExitCode: 200})
	}
	if isInstance {
		if err := recv.load(raw); err != nil {
			return _failure(err)
		}
	}
	result, handled, err := recv.dispatch(req.Selector, req.Args)
	if !handled {
		return _encodeResponse(_response{ExitCode: 200})
	}
	if err != nil {
		return _failure(err)
	}
	resp := _response{Result: &result}
	if isInstance {
		state, err := json.Marshal(recv)
		if err != nil {
			return _failure(err)
		}
		resp.Instance = state
	}
	return _encodeResponse(resp)
}

func _info() string {
	data, err := json.Marshal(map[string]interface{}{
		"class":    _className,
		"parent":   _parentName,
		"hash":     _sourceHash,
		"compiled": _compiledSelectors,
		"skipped":  _skippedSelectors,
	})
	if err != nil {
		return "{}"
	}
	return string(data)
}"#;

pub const STANDALONE: &str = r#"// --- standalone entry point ---

func _fail(err error) int {
	fmt.Fprintln(os.Stderr, "error:", err)
	return 1
}

func _openDB() (*sql.DB, error) {
	path := os.Getenv("TALK_DB")
	if path == "" {
		home, err := os.UserHomeDir()
		if err != nil {
			return nil, err
		}
		path = filepath.Join(home, ".talk", "instances.db")
	}
	return sql.Open("sqlite", path)
}

func _loadInstance(db *sql.DB, id string) (string, bool, error) {
	var data string
	err := db.QueryRow("SELECT data FROM instances WHERE id = ?", id).Scan(&data)
	if err == sql.ErrNoRows {
		return "", false, nil
	}
	if err != nil {
		return "", false, err
	}
	return data, true, nil
}

func _saveInstance(db *sql.DB, id string, data string) error {
	_, err := db.Exec(
		"INSERT INTO instances (id, data) VALUES (?, ?) ON CONFLICT(id) DO UPDATE SET data = excluded.data",
		id, data,
	)
	return err
}

func _runOnce(id string, selector string, args []string) int {
	db, err := _openDB()
	if err != nil {
		return _fail(err)
	}
	defer db.Close()
	recv := _receiverFor(id)
	if !recv.responds(selector) {
		return 200
	}
	raw, found, err := _loadInstance(db, id)
	if err != nil {
		return _fail(err)
	}
	if found {
		if err := recv.load(raw); err != nil {
			return _fail(err)
		}
	} else if id != _className {
		return _fail(fmt.Errorf("no %s instance %q", _className, id))
	}
	result, handled, err := recv.dispatch(selector, args)
	if !handled {
		return 200
	}
	if err != nil {
		return _fail(err)
	}
	state, err := json.Marshal(recv)
	if err != nil {
		return _fail(err)
	}
	if err := _saveInstance(db, id, string(state)); err != nil {
		return _fail(err)
	}
	fmt.Println(result)
	return 0
}

func _serve() int {
	scanner := bufio.NewScanner(os.Stdin)
	scanner.Buffer(make([]byte, 0, 64*1024), 16*1024*1024)
	for scanner.Scan() {
		line := strings.TrimSpace(scanner.Text())
		if line == "" {
			continue
		}
		fmt.Println(_handleRequest(line))
	}
	if err := scanner.Err(); err != nil {
		return _fail(err)
	}
	return 0
}

func main() {
	if len(os.Args) >= 2 {
		switch os.Args[1] {
		case "--source":
			fmt.Print(_sourceCode)
			return
		case "--hash":
			fmt.Println(_sourceHash)
			return
		case "--info":
			fmt.Println(_info())
			return
		case "--serve":
			os.Exit(_serve())
		}
	}
	if len(os.Args) < 3 {
		fmt.Fprintf(os.Stderr, "usage: %s <instance-id> <selector> [args...]\n", os.Args[0])
		os.Exit(1)
	}
	os.Exit(_runOnce(os.Args[1], os.Args[2], os.Args[3:]))
}"#;

pub const PLUGIN: &str = r#"// --- plugin entry points ---

// The caller owns the returned strings and frees them.

//export GetClassName
func GetClassName() *C.char {
	return C.CString(_className)
}

//export Dispatch
func Dispatch(request *C.char) *C.char {
	return C.CString(_handleRequest(C.GoString(request)))
}

func main() {}"#;

#[cfg(test)]
mod tests {
    use super::*;

    /// The identifier a Go file uses to refer to an imported package.
    fn package_ident(path: &str) -> &str {
        path.rsplit('/').next().unwrap_or(path)
    }

    #[test]
    fn every_common_import_is_used() {
        let common = [VALUES, COLLECTIONS, PRIMITIVES, INTERPRETER, PROTOCOL].concat();
        for path in COMMON_IMPORTS {
            let usage = format!("{}.", package_ident(path));
            assert!(common.contains(&usage), "`{path}` is never used");
        }
    }

    #[test]
    fn standalone_imports_are_used() {
        for path in STANDALONE_IMPORTS {
            assert!(STANDALONE.contains(&format!("{}.", package_ident(path))));
        }
        assert!(STANDALONE.contains("sql.Open(\"sqlite\""));
    }

    #[test]
    fn plugin_uses_cgo() {
        assert!(PLUGIN.contains("//export GetClassName"));
        assert!(PLUGIN.contains("//export Dispatch"));
        assert!(PLUGIN.contains("C.GoString"));
    }

    #[test]
    fn import_block_per_mode() {
        let binary = imports(EmitMode::Binary).to_pretty_string();
        assert!(binary.starts_with("import ("));
        assert!(binary.contains("\t\"database/sql\""));
        assert!(binary.contains("\t_ \"modernc.org/sqlite\""));
        assert!(!binary.contains("import \"C\""));

        let plugin = imports(EmitMode::Plugin).to_pretty_string();
        assert!(plugin.starts_with("import \"C\"\n\nimport ("));
        assert!(!plugin.contains("database/sql"));
        assert!(plugin.contains("\t\"os/exec\""));
    }

    #[test]
    fn to_int_is_integer_only() {
        let start = VALUES.find("func _toInt(").unwrap();
        let body = &VALUES[start..start + VALUES[start..].find("\n}\n").unwrap()];
        assert!(body.contains("strconv.Atoi(s)"));
        assert!(!body.contains("ParseFloat"));
        assert!(body.ends_with("return 0"));
    }

    #[test]
    fn sections_differ_only_in_entry_points() {
        let binary = sections(EmitMode::Binary);
        let plugin = sections(EmitMode::Plugin);
        assert_eq!(binary.len(), plugin.len());
        assert_eq!(binary[..binary.len() - 1], plugin[..plugin.len() - 1]);
        assert!(binary.last().unwrap().contains("func main() {\n"));
        assert!(plugin.last().unwrap().contains("func main() {}"));
    }

    #[test]
    fn unhandled_selectors_map_to_200() {
        assert!(PROTOCOL.contains("_response{ExitCode: 200}"));
        assert!(STANDALONE.contains("return 200"));
    }
}
