//! Smoke coverage for the remaining language extractors: each one must
//! produce class-like drafts, scoped members, base names, and call facts.

use cartograph::core::NodeKind;
use cartograph::extractors::{Extractor, Receiver};
use std::path::Path;

#[test]
fn javascript_classes_methods_and_heritage() {
    let extractor = cartograph::extractors::javascript::JavaScriptExtractor::new();
    let out = extractor
        .extract(
            Path::new("app.js"),
            r#"
class Animal {
  speak() {
    return makeSound();
  }
}

class Dog extends Animal {
  speak() {
    return this.bark();
  }

  bark() {
    return "woof";
  }
}

function makeSound() {
  return "";
}
"#,
        )
        .unwrap();

    let dog = out.entities.iter().find(|e| e.name == "Dog").unwrap();
    assert_eq!(dog.kind, NodeKind::Class);
    assert_eq!(dog.base_classes, vec!["Animal".to_string()]);

    let bark = out.entities.iter().find(|e| e.name == "bark").unwrap();
    assert_eq!(bark.kind, NodeKind::Method);
    assert_eq!(bark.scope, vec!["Dog".to_string()]);

    let this_call = out.calls.iter().find(|c| c.callee == "bark").unwrap();
    assert_eq!(this_call.receiver, Receiver::SelfLike);

    let free_call = out.calls.iter().find(|c| c.callee == "makeSound").unwrap();
    assert_eq!(free_call.receiver, Receiver::None);
}

#[test]
fn typescript_interfaces_and_enums() {
    let extractor = cartograph::extractors::typescript::TypeScriptExtractor::new();
    let out = extractor
        .extract(
            Path::new("model.ts"),
            r#"
interface Shape {
  area(): number;
}

interface Circle extends Shape {
  radius: number;
}

enum Color {
  Red,
  Green,
}

export class Square implements Shape {
  area(): number {
    return computeArea();
  }
}

function computeArea(): number {
  return 0;
}
"#,
        )
        .unwrap();

    let shape = out.entities.iter().find(|e| e.name == "Shape").unwrap();
    assert_eq!(shape.kind, NodeKind::Interface);

    let circle = out.entities.iter().find(|e| e.name == "Circle").unwrap();
    assert_eq!(circle.base_classes, vec!["Shape".to_string()]);

    let color = out.entities.iter().find(|e| e.name == "Color").unwrap();
    assert_eq!(color.kind, NodeKind::Enum);

    // `export class` is unwrapped; `implements` feeds base_classes.
    let square = out.entities.iter().find(|e| e.name == "Square").unwrap();
    assert_eq!(square.kind, NodeKind::Class);
    assert_eq!(square.base_classes, vec!["Shape".to_string()]);

    assert!(out.calls.iter().any(|c| c.callee == "computeArea"));
}

#[test]
fn go_structs_interfaces_and_methods() {
    let extractor = cartograph::extractors::go::GoExtractor::new();
    let out = extractor
        .extract(
            Path::new("pool.go"),
            r#"
package pool

type Pool struct {
	workers int
}

type Runner interface {
	Run()
}

func (p *Pool) Grow(n int) {
	p.resize(n)
}

func (p *Pool) resize(n int) {
}

func NewPool() *Pool {
	return &Pool{}
}
"#,
        )
        .unwrap();

    let pool = out.entities.iter().find(|e| e.name == "Pool").unwrap();
    assert_eq!(pool.kind, NodeKind::Struct);

    let runner = out.entities.iter().find(|e| e.name == "Runner").unwrap();
    assert_eq!(runner.kind, NodeKind::Interface);

    // Methods carry their receiver type as scope.
    let grow = out.entities.iter().find(|e| e.name == "Grow").unwrap();
    assert_eq!(grow.kind, NodeKind::Method);
    assert_eq!(grow.scope, vec!["Pool".to_string()]);

    let ctor = out.entities.iter().find(|e| e.name == "NewPool").unwrap();
    assert_eq!(ctor.kind, NodeKind::Function);

    let call = out.calls.iter().find(|c| c.callee == "resize").unwrap();
    assert_eq!(
        call.caller_scope,
        vec!["Pool".to_string(), "Grow".to_string()]
    );
}

#[test]
fn java_classes_interfaces_and_invocations() {
    let extractor = cartograph::extractors::java::JavaExtractor::new();
    let out = extractor
        .extract(
            Path::new("Account.java"),
            r#"
public interface Auditable {
    void audit();
}

public class Account extends Entity implements Auditable {
    public void audit() {
        this.record();
    }

    private void record() {
        Logger logger = new Logger();
    }
}
"#,
        )
        .unwrap();

    let auditable = out.entities.iter().find(|e| e.name == "Auditable").unwrap();
    assert_eq!(auditable.kind, NodeKind::Interface);

    let account = out.entities.iter().find(|e| e.name == "Account").unwrap();
    assert_eq!(account.kind, NodeKind::Class);
    assert_eq!(
        account.base_classes,
        vec!["Entity".to_string(), "Auditable".to_string()]
    );

    // The interface and the class each declare `audit` in their own scope.
    assert!(out
        .entities
        .iter()
        .any(|e| e.name == "audit" && e.scope == vec!["Auditable".to_string()]));
    assert!(out
        .entities
        .iter()
        .any(|e| e.name == "audit" && e.scope == vec!["Account".to_string()]));

    let this_call = out.calls.iter().find(|c| c.callee == "record").unwrap();
    assert_eq!(this_call.receiver, Receiver::SelfLike);

    // `new Logger()` is a constructor-style call fact.
    assert!(out.calls.iter().any(|c| c.callee == "Logger"));
}
