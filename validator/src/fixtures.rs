//! Small planning tasks shared by the unit tests.

use planx::Declaration;
use planx::pddl::{Input, contextualize, parse_pddl_domain, parse_pddl_problem};

pub const GRIPPER_DOMAIN: &str = include_str!("../tests/resources/gripper-domain.pddl");
pub const GRIPPER_PROBLEM: &str = include_str!("../tests/resources/gripper.pddl");

const TYPED_GRIPPER_DOMAIN: &str = "(define (domain typed-gripper)
    (:requirements :strips :typing)
    (:types room ball gripper - object red-ball - ball)
    (:predicates (at-robby ?r - room) (at ?b - ball ?r - room) (free ?g - gripper) (carry ?o - ball ?g - gripper))
    (:action pick
        :parameters (?obj - ball ?room - room ?gripper - gripper)
        :precondition (and (at ?obj ?room) (at-robby ?room) (free ?gripper))
        :effect (and (carry ?obj ?gripper) (not (at ?obj ?room)) (not (free ?gripper)))))";

const TYPED_GRIPPER_PROBLEM: &str = "(define (problem typed-gripper-1) (:domain typed-gripper)
    (:objects rooma roomb - room ball1 - ball red1 - red-ball left right - gripper)
    (:init (at-robby rooma) (at ball1 rooma) (at red1 rooma) (free left) (free right))
    (:goal (at red1 roomb)))";

const LIGHTS_DOMAIN: &str = "(define (domain lights)
    (:requirements :adl :derived-predicates)
    (:types switch lamp - device room)
    (:constants main - switch)
    (:predicates (on ?d - device) (in ?d - device ?r - room) (wired ?s - switch ?l - lamp) (lit ?r - room))
    (:functions (energy))
    (:derived (lit ?r - room) (exists (?l - lamp) (and (in ?l ?r) (on ?l))))
    (:action toggle
        :parameters (?s - switch)
        :precondition (not (= ?s main))
        :effect (and (when (on ?s) (not (on ?s)))
                     (when (not (on ?s)) (on ?s))
                     (forall (?l - lamp) (when (wired ?s ?l) (on ?l)))
                     (increase (energy) 1)))
    (:action reset
        :parameters ()
        :effect (on main))
    (:action broken
        :parameters ()
        :effect (or (on main))))";

const LIGHTS_PROBLEM: &str = "(define (problem two-lamps) (:domain lights)
    (:objects s1 - switch l1 l2 - lamp kitchen - room)
    (:init (in l1 kitchen) (in l2 kitchen) (wired s1 l1) (= (energy) 0))
    (:goal (lit kitchen)))";

const REACHABILITY_DOMAIN: &str = "(define (domain graph)
    (:requirements :strips :derived-predicates :existential-preconditions)
    (:predicates (connected ?x ?y) (reachable ?x ?y) (at ?x))
    (:derived (reachable ?x ?y)
        (or (connected ?x ?y)
            (exists (?z) (and (connected ?x ?z) (reachable ?z ?y)))))
    (:action travel
        :parameters (?from ?to)
        :precondition (and (at ?from) (reachable ?from ?to))
        :effect (and (not (at ?from)) (at ?to))))";

const REACHABILITY_PROBLEM: &str = "(define (problem cycle) (:domain graph)
    (:objects a b c d)
    (:init (at a) (connected a b) (connected b c) (connected c a))
    (:goal (at d)))";

const ALTERNATIVES_DOMAIN: &str = "(define (domain alternatives)
    (:requirements :strips :derived-predicates)
    (:predicates (p ?x) (q ?x) (good ?x) (done ?x))
    (:derived (good ?x) (p ?x))
    (:derived (good ?x) (q ?x))
    (:action go
        :parameters (?x)
        :precondition (good ?x)
        :effect (done ?x)))";

const ALTERNATIVES_PROBLEM: &str = "(define (problem one-of-each) (:domain alternatives)
    (:objects a1 b1 c1)
    (:init (p a1) (q b1))
    (:goal (and (done a1) (done b1))))";

pub fn declaration(domain: &str, problem: &str) -> Declaration {
    let dom = parse_pddl_domain(Input::from_string(domain)).unwrap();
    let pb = parse_pddl_problem(Input::from_string(problem)).unwrap();
    contextualize(&dom, &pb).unwrap()
}

/// Untyped gripper with two rooms, four balls and two grippers.
pub fn gripper() -> Declaration {
    declaration(GRIPPER_DOMAIN, GRIPPER_PROBLEM)
}

pub fn typed_gripper() -> Declaration {
    declaration(TYPED_GRIPPER_DOMAIN, TYPED_GRIPPER_PROBLEM)
}

/// Switches turning lamps on, with conditional and universal effects and a derived predicate.
pub fn lights() -> Declaration {
    declaration(LIGHTS_DOMAIN, LIGHTS_PROBLEM)
}

/// Cyclic graph with a recursive reachability predicate.
pub fn reachability() -> Declaration {
    declaration(REACHABILITY_DOMAIN, REACHABILITY_PROBLEM)
}

/// Derived predicate `good` with two definitions, one per source predicate.
pub fn alternatives() -> Declaration {
    declaration(ALTERNATIVES_DOMAIN, ALTERNATIVES_PROBLEM)
}
