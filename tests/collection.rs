use dom_mirror::{
	memory::{MemoryHost, MemoryListener, NodeId},
	Collection, Dom, ElementOptions, Error, Host, Node,
};
use std::{cell::RefCell, rc::Rc};

fn labelled(host: &MemoryHost, labels: &[&str]) -> Collection<MemoryHost> {
	labels
		.iter()
		.map(|label| Node::create(host, "li", ElementOptions::new().attribute("data-label", *label)).unwrap())
		.collect()
}

fn label(node: &Node<MemoryHost>) -> String {
	node.attributes()["data-label"].clone()
}

#[test]
fn each_visits_in_order_with_forward_indices() {
	let host = MemoryHost::new();
	let items = labelled(&host, &["A", "B", "C"]);

	let mut seen = Vec::new();
	items.each(|node, i| seen.push((label(node), i)), false);
	assert_eq!(seen, [("A".to_owned(), 0), ("B".to_owned(), 1), ("C".to_owned(), 2)]);

	seen.clear();
	items.each(|node, i| seen.push((label(node), i)), true);
	assert_eq!(seen, [("C".to_owned(), 2), ("B".to_owned(), 1), ("A".to_owned(), 0)]);
}

#[test]
fn try_each_stops_at_the_first_error() {
	let host = MemoryHost::new();
	let items = labelled(&host, &["A", "B", "C"]);

	let mut visited = 0;
	let result = items.try_each(
		|_, i| {
			visited += 1;
			if i == 1 {
				Err(Error::Detached)
			} else {
				Ok(())
			}
		},
		false,
	);
	assert_eq!(result.unwrap_err(), Error::Detached);
	assert_eq!(visited, 2);
}

#[test]
fn add_adopts_raw_handles() {
	let host = MemoryHost::new();
	let raw = host.create_element("li").unwrap();
	host.add_class(&raw, "done").unwrap();
	host.set_attribute(&raw, "data-label", "raw").unwrap();

	let mut items = Collection::new();
	items.add((&host, raw)).add(Node::create(&host, "li", ElementOptions::new()).unwrap());
	assert_eq!(items.count(), 2);

	let direct = Node::adopt(&host, raw);
	let added = items.get(0).unwrap();
	assert_eq!(*added.mirror(), *direct.mirror());
	assert_eq!(added.live(), &raw);
	assert_eq!(items.get(1).unwrap().tag().as_deref(), Some("li"));
}

#[test]
fn from_sequence_keeps_order() {
	let host = MemoryHost::new();
	let nodes = vec![
		Node::create(&host, "a", ElementOptions::new()).unwrap(),
		Node::create(&host, "b", ElementOptions::new()).unwrap(),
	];
	let items = Collection::from(nodes);
	let tags: Vec<_> = items.iter().map(|node| node.tag().unwrap()).collect();
	assert_eq!(tags, ["a", "b"]);

	assert!(Collection::<MemoryHost>::new().is_empty());
	assert_eq!(Collection::<MemoryHost>::default().count(), 0);
}

#[test]
fn insert_into_accepts_nodes_and_raw_handles() {
	let host = MemoryHost::new();
	let items = labelled(&host, &["A", "B"]);
	let ids: Vec<NodeId> = items.iter().map(|node| *node.live()).collect();

	let list = Node::create(&host, "ul", ElementOptions::new()).unwrap();
	items.insert_into(&list).unwrap();
	assert_eq!(host.children(*list.live()).unwrap(), ids);

	let raw = host.create_element("ol").unwrap();
	items.insert_into(&raw).unwrap();
	assert_eq!(host.children(raw).unwrap(), ids);
	assert!(host.children(*list.live()).unwrap().is_empty());
}

#[test]
fn bulk_listeners() {
	let host = MemoryHost::new();
	let items = labelled(&host, &["A", "B", "C"]);

	let clicked = Rc::new(RefCell::new(Vec::new()));
	let listener = MemoryListener::new({
		let clicked = Rc::clone(&clicked);
		move |event| clicked.borrow_mut().push(event.target)
	});

	items.on("click", &listener).unwrap();
	for node in &items {
		host.dispatch(*node.live(), "click").unwrap();
	}
	assert_eq!(clicked.borrow().len(), 3);

	items.off("click", &listener).unwrap();
	for node in &items {
		host.dispatch(*node.live(), "click").unwrap();
	}
	assert_eq!(clicked.borrow().len(), 3);
}

#[test]
fn select_adopts_matches_in_document_order() {
	let host = MemoryHost::new();
	let dom = Dom::new(host.clone());
	let root = host.document_root().unwrap();

	let list = dom.element("ul", ["todo"], Vec::<(&str, &str)>::new()).unwrap();
	list.insert_into(&root).unwrap();
	for (text, done) in &[("one", true), ("two", false), ("three", true)] {
		let item = dom.create("li", ElementOptions::new().content(*text)).unwrap();
		if *done {
			item.add_class("done").unwrap();
		}
		item.insert_into(&list).unwrap();
	}

	let done = dom.select("ul.todo > li.done").unwrap();
	assert_eq!(done.count(), 2);
	let texts: Vec<_> = done.iter().map(|node| host.text_content(*node.live()).unwrap().unwrap()).collect();
	assert_eq!(texts, ["one", "three"]);
	assert!(done.iter().all(|node| node.tag().is_none() && node.classes().iter().any(|class| class == "done")));

	assert_eq!(Collection::select(&host, list.live(), "li").unwrap().count(), 3);
	assert!(dom.select_one("ol").unwrap().is_none());
	assert!(dom.select("li,").is_err());
	assert_eq!(list.qsa("*").unwrap().count(), 3);
}

#[test]
fn into_iterator_yields_owned_nodes() {
	let host = MemoryHost::new();
	let items = labelled(&host, &["A", "B"]);
	let labels: Vec<_> = items.into_iter().map(|node| label(&node)).collect();
	assert_eq!(labels, ["A", "B"]);
}
