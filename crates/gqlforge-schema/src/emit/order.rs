//! Emission order and cycle detection.

use std::collections::HashSet;

use crate::schema::{ObjectOrigin, ResolvedSchema, TypeGraph, TypeId, TypeNode};

/// Stable emission order of one resolved schema.
#[derive(Debug, Default)]
pub struct TypeOrder {
    /// Declared objects, enums and custom scalars, first-encountered order.
    pub declared: Vec<TypeId>,
    /// Instantiated objects, completion order.
    pub instantiated: Vec<TypeId>,
    /// Objects that take part in a reference cycle, self-loops included.
    pub cyclic: HashSet<TypeId>,
}

impl TypeOrder {
    pub fn of(schema: &ResolvedSchema) -> Self {
        let graph = &schema.graph;
        let mut order = Self {
            instantiated: schema.instantiations().to_vec(),
            ..Self::default()
        };

        let mut visited = HashSet::new();
        for &root in &schema.roots {
            visit(graph, root, &mut visited, &mut order.declared);
        }
        // Unreachable leftovers keep creation order.
        for (_, id) in graph.named() {
            visit(graph, id, &mut visited, &mut order.declared);
        }

        order.cyclic = cyclic_objects(graph);
        order
    }

    /// Every emitted type: declared first, then instantiations.
    pub fn all(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.declared.iter().chain(&self.instantiated).copied()
    }

    pub fn is_cyclic(&self, id: TypeId) -> bool {
        self.cyclic.contains(&id)
    }
}

/// Preorder walk over field and argument types. Instantiated objects are
/// walked through but listed separately; built-in scalars are skipped.
fn visit(graph: &TypeGraph, id: TypeId, visited: &mut HashSet<TypeId>, out: &mut Vec<TypeId>) {
    let id = graph.named_type(id);
    if !visited.insert(id) {
        return;
    }
    match graph.node(id) {
        TypeNode::Object(object) => {
            if matches!(object.origin, ObjectOrigin::Declared(_)) {
                out.push(id);
            }
            for field in &object.fields {
                visit(graph, field.ty, visited, out);
                for arg in &field.args {
                    visit(graph, arg.ty, visited, out);
                }
            }
        }
        TypeNode::Enum(_) => out.push(id),
        TypeNode::Scalar(scalar) if !scalar.is_builtin() => out.push(id),
        _ => {}
    }
}

/// Objects on a reference cycle, found with Tarjan's strongly connected
/// components over object-to-object field edges.
pub fn cyclic_objects(graph: &TypeGraph) -> HashSet<TypeId> {
    let objects: Vec<TypeId> = (0..graph.len())
        .map(TypeId::from_index)
        .filter(|&id| graph.object(id).is_some())
        .collect();

    let mut tarjan = Tarjan {
        graph,
        index: vec![None; graph.len()],
        lowlink: vec![0; graph.len()],
        on_stack: vec![false; graph.len()],
        stack: Vec::new(),
        next: 0,
        cyclic: HashSet::new(),
    };
    for id in objects {
        if tarjan.index[id.index()].is_none() {
            tarjan.connect(id);
        }
    }
    tarjan.cyclic
}

fn successors(graph: &TypeGraph, id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
    graph
        .object(id)
        .into_iter()
        .flat_map(|object| &object.fields)
        .map(|field| graph.named_type(field.ty))
        .filter(|&target| graph.object(target).is_some())
}

struct Tarjan<'g> {
    graph: &'g TypeGraph,
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<TypeId>,
    next: usize,
    cyclic: HashSet<TypeId>,
}

impl Tarjan<'_> {
    fn connect(&mut self, id: TypeId) {
        let v = id.index();
        self.index[v] = Some(self.next);
        self.lowlink[v] = self.next;
        self.next += 1;
        self.stack.push(id);
        self.on_stack[v] = true;

        let mut self_loop = false;
        for target in successors(self.graph, id).collect::<Vec<_>>() {
            let w = target.index();
            if target == id {
                self_loop = true;
            }
            match self.index[w] {
                None => {
                    self.connect(target);
                    self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                }
                Some(index) if self.on_stack[w] => {
                    self.lowlink[v] = self.lowlink[v].min(index);
                }
                Some(_) => {}
            }
        }

        if Some(self.lowlink[v]) != self.index[v] {
            return;
        }
        let mut component = Vec::new();
        while let Some(member) = self.stack.pop() {
            self.on_stack[member.index()] = false;
            component.push(member);
            if member == id {
                break;
            }
        }
        if component.len() > 1 || self_loop {
            self.cyclic.extend(component);
        }
    }
}
